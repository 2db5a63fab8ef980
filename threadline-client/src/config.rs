use anyhow::Context;
use chrono_tz::Tz;

/// Settings of a commenting surface, every field being optional in JSON
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Time zone comment timestamps are displayed in
    pub time_zone: Tz,

    /// Number of characters of the parent shown in a reply's label
    pub preview_chars: usize,

    /// Upper bound on deletes in flight during a cascade, 0 meaning 1
    pub max_concurrent_deletes: usize,
}

impl Default for SurfaceConfig {
    fn default() -> SurfaceConfig {
        SurfaceConfig {
            time_zone: chrono_tz::Asia::Tokyo,
            preview_chars: 30,
            max_concurrent_deletes: 16,
        }
    }
}

impl SurfaceConfig {
    pub fn from_json(json: &str) -> anyhow::Result<SurfaceConfig> {
        serde_json::from_str(json).context("parsing surface configuration")
    }

    pub(crate) fn delete_concurrency(&self) -> usize {
        self.max_concurrent_deletes.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        assert_eq!(SurfaceConfig::from_json("{}").unwrap(), SurfaceConfig::default());
    }

    #[test]
    fn partial_json() {
        let cfg =
            SurfaceConfig::from_json(r#"{"time_zone":"Europe/Paris","max_concurrent_deletes":0}"#)
                .unwrap();
        assert_eq!(cfg.time_zone, chrono_tz::Europe::Paris);
        assert_eq!(cfg.preview_chars, 30);
        assert_eq!(cfg.delete_concurrency(), 1);
    }

    #[test]
    fn unknown_time_zone_is_rejected() {
        let err = SurfaceConfig::from_json(r#"{"time_zone":"Mars/Olympus"}"#).unwrap_err();
        assert!(format!("{err:#}").contains("parsing surface configuration"));
    }
}
