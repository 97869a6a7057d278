use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use std::path::Path;

/// Default location of the TOML configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads application configuration by layering built-in defaults, the TOML
    /// file at `path`, and `APP_`-prefixed environment variables.
    ///
    /// Nested keys are separated by a double underscore, e.g.
    /// `APP_ANALYSIS__BAYESIAN_SAMPLES=50000`. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
        let path = path.as_ref();
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("APP_").split("__"))
            .join(Json::file(path.with_extension("json")))
            .extract()?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplerMode;
    use figment::Jail;

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let config = ConfigLoader::load_from("does-not-exist.toml").map_err(|e| e.to_string())?;

            assert_eq!(config.server.port, 8000);
            assert_eq!(config.analysis.bayesian_samples, 100_000);
            Ok(())
        });
    }

    #[test]
    fn toml_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "Config.toml",
                r#"
                [server]
                port = 9100

                [analysis]
                bayesian_samples = 20000
                seed = 7
                sampler = "normal_approximation"

                [analysis.thresholds]
                min_practical_uplift_pct = 5.0
                "#,
            )?;

            let config = ConfigLoader::load_from("Config.toml").map_err(|e| e.to_string())?;

            assert_eq!(config.server.port, 9100);
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.analysis.bayesian_samples, 20_000);
            assert_eq!(config.analysis.seed, Some(7));
            assert_eq!(config.analysis.sampler, SamplerMode::NormalApproximation);
            assert!((config.analysis.thresholds.min_practical_uplift_pct - 5.0).abs() < f64::EPSILON);
            assert!((config.analysis.thresholds.certainty_high - 0.90).abs() < f64::EPSILON);
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("Config.toml", "[server]\nport = 9100\n")?;
            jail.set_env("APP_SERVER__PORT", "9200");
            jail.set_env("APP_ANALYSIS__POWER", "0.9");

            let config = ConfigLoader::load_from("Config.toml").map_err(|e| e.to_string())?;

            assert_eq!(config.server.port, 9200);
            assert!((config.analysis.power - 0.9).abs() < f64::EPSILON);
            Ok(())
        });
    }

    #[test]
    fn malformed_file_is_an_error() {
        Jail::expect_with(|jail| {
            jail.create_file("Config.toml", "[server]\nport = \"not a number\"\n")?;

            assert!(ConfigLoader::load_from("Config.toml").is_err());
            Ok(())
        });
    }
}
