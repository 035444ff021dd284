pub mod bench;
pub mod device;
pub mod selftest;
pub mod server;
pub mod status;
pub mod stream;

use eca30_core::{Bootstrap, Device, EngineConfig};

/// Engine settings gathered from the global CLI flags.
#[derive(Debug, Default, Clone, Copy)]
pub struct EngineOptions<'a> {
    pub config: Option<&'a str>,
    pub bootstrap: Option<&'a str>,
    pub block_size: Option<usize>,
}

/// Build the engine config: file values first, then flag overrides.
pub fn load_config(opts: &EngineOptions<'_>) -> eca30_core::Result<EngineConfig> {
    let mut config = match opts.config {
        Some(path) => EngineConfig::from_json_file(std::path::Path::new(path))?,
        None => EngineConfig::default(),
    };
    if let Some(mode) = opts.bootstrap {
        config.bootstrap = mode.parse::<Bootstrap>()?;
    }
    if let Some(block_size) = opts.block_size {
        config.block_size = block_size;
    }
    config.validate()?;
    Ok(config)
}

/// Build a device from the CLI flags, exiting with a message on failure.
pub fn make_device(opts: &EngineOptions<'_>, read_only: bool) -> Device {
    let result = load_config(opts).and_then(|mut config| {
        if read_only {
            config.writable = false;
        }
        Device::new(&config)
    });
    match result {
        Ok(device) => device,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_defaults() {
        let config = load_config(&EngineOptions::default()).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_flags_override_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"bootstrap": "entropy", "block_size": 128}}"#).unwrap();
        let path = f.path().to_str().unwrap().to_string();

        let from_file = load_config(&EngineOptions {
            config: Some(&path),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(from_file.bootstrap, Bootstrap::Entropy);
        assert_eq!(from_file.block_size, 128);

        let overridden = load_config(&EngineOptions {
            config: Some(&path),
            bootstrap: Some("rule30"),
            block_size: Some(32),
        })
        .unwrap();
        assert_eq!(overridden.bootstrap, Bootstrap::Rule30);
        assert_eq!(overridden.block_size, 32);
    }

    #[test]
    fn test_bad_block_size_flag() {
        let r = load_config(&EngineOptions {
            block_size: Some(0),
            ..Default::default()
        });
        assert!(matches!(r, Err(eca30_core::Error::Config(_))));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let r = load_config(&EngineOptions {
            config: path.to_str(),
            ..Default::default()
        });
        assert!(matches!(r, Err(eca30_core::Error::Io(_))));
    }

    #[test]
    fn test_make_device_read_only() {
        let device = make_device(&EngineOptions::default(), true);
        assert!(!device.is_writable());
        let device = make_device(&EngineOptions::default(), false);
        assert!(device.is_writable());
    }
}
