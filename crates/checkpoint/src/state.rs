use sync_core::State;

use crate::Checkpoint;

impl Checkpoint for State {
    const CHECKPOINT_KIND: &'static str = "source-sync-state";

    fn to_cli_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    fn from_cli_string(s: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(s.trim())?)
    }
}
