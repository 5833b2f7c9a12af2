use serde::{Serialize, de::DeserializeOwned};
use std::fs::File;
use std::path::Path;
use std::fmt::Display;

use crate::error::ConfigError;

pub trait YamlRW: Serialize + DeserializeOwned {
    fn read_yaml<P: Copy + Display + AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|err| ConfigError::File(path.to_string(), err))?;
        serde_yaml::from_reader(file).map_err(|err| ConfigError::Yaml(path.to_string(), err))
    }

    fn write_yaml<P: Copy + Display + AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let file = File::create(path).map_err(|err| ConfigError::File(path.to_string(), err))?;
        serde_yaml::to_writer(file, &self).map_err(|err| ConfigError::Yaml(path.to_string(), err))
    }
}
