#![forbid(unsafe_code)]

#[cfg(unix)]
mod unix {
    use std::fs;
    use std::io;
    use std::process::{Command, Stdio};
    use tempfile::tempdir;

    /// A device that cannot be resolved means there is no event source, and
    /// the daemon must refuse to start instead of spinning on empty windows.
    #[test]
    fn unattachable_probe_aborts_startup() -> io::Result<()> {
        let dir = tempdir()?;
        let config_path = dir.path().join("config.toml");
        fs::write(
            &config_path,
            "[sampler]\ndevice = \"ratuned-test-missing\"\n\n\
             [window]\ncycle = 100\n\n\
             [inference]\ntimeout = 50\n",
        )?;

        let output = Command::new(env!("CARGO_BIN_EXE_ratuned"))
            .arg("--conffile")
            .arg(&config_path)
            .arg("-v")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        assert!(!output.status.success());

        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        assert!(combined.contains("attach block I/O probe"));
        // It never reached the control loop.
        assert!(!combined.contains("cycle complete"));

        Ok(())
    }

    #[test]
    fn rejected_config_aborts_startup() -> io::Result<()> {
        let dir = tempdir()?;
        let config_path = dir.path().join("config.toml");
        // Timeout does not fit inside the window.
        fs::write(
            &config_path,
            "[window]\ncycle = 100\n\n[inference]\ntimeout = 100\n",
        )?;

        let output = Command::new(env!("CARGO_BIN_EXE_ratuned"))
            .arg("--conffile")
            .arg(&config_path)
            .output()?;

        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("must be shorter than"));

        Ok(())
    }
}
