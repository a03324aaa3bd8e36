use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;

/// Process-wide binding settings
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BindingConfig {
    /// Whether serialized contexts carry the engine's precomputed tables
    #[serde(default = "default_serialize_precompute")]
    pub serialize_precompute: bool,

    /// Upper bound on a buffer handed to deserialization
    #[serde(default = "default_max_buffer_len")]
    pub max_buffer_len: u64,

    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            serialize_precompute: default_serialize_precompute(),
            max_buffer_len: default_max_buffer_len(),
            log_filter: default_log_filter(),
        }
    }
}

fn default_serialize_precompute() -> bool {
    true
}
fn default_max_buffer_len() -> u64 {
    hebind_proto::DEFAULT_MAX_LEN
}
fn default_log_filter() -> String {
    "hebind=info".into()
}

impl BindingConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config: BindingConfig = Figment::new()
            .merge(Toml::file("hebind.toml"))
            .merge(Env::prefixed("HEBIND_"))
            .extract()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_sources() {
        Jail::expect_with(|_jail| {
            let config = BindingConfig::load().expect("defaults load");
            assert_eq!(config, BindingConfig::default());
            assert!(config.serialize_precompute);
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "hebind.toml",
                r#"
                serialize_precompute = false
                max_buffer_len = 4096
                "#,
            )?;
            jail.set_env("HEBIND_MAX_BUFFER_LEN", "8192");

            let config = BindingConfig::load().expect("config loads");
            assert!(!config.serialize_precompute);
            assert_eq!(config.max_buffer_len, 8192);
            assert_eq!(config.log_filter, "hebind=info");
            Ok(())
        });
    }
}
