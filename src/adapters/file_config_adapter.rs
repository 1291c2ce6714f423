//! INI file configuration adapter.

use crate::domain::error::PostesterError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PostesterError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse(content, &path.display().to_string())
    }

    pub fn from_string(content: &str) -> Result<Self, PostesterError> {
        Self::parse(content.to_string(), "<string>")
    }

    fn parse(content: String, origin: &str) -> Result<Self, PostesterError> {
        let mut config = Ini::new();
        config
            .read(content)
            .map_err(|reason| PostesterError::ConfigParse {
                file: origin.to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

fn invalid(section: &str, key: &str, reason: String) -> PostesterError {
    PostesterError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, PostesterError> {
        self.config
            .getint(section, key)
            .map_err(|reason| invalid(section, key, reason))
    }

    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, PostesterError> {
        self.config
            .getfloat(section, key)
            .map_err(|reason| invalid(section, key, reason))
    }
}
