pub mod compare;
pub mod matrix;
pub mod text;

use std::sync::Arc;

use anyhow::Result;
use cas_equiv::oracle::OpenAiCompatibleModel;
use cas_equiv::{EquivConfig, EquivalenceEngine, OracleAdapter, OracleError};

/// Engine with the HTTP oracle, or offline when asked to or when no API key
/// is configured.
pub fn build_engine(config: EquivConfig, offline: bool) -> Result<EquivalenceEngine> {
    if offline {
        return Ok(EquivalenceEngine::offline(config));
    }
    match OpenAiCompatibleModel::from_config(&config.oracle) {
        Ok(model) => {
            let oracle = OracleAdapter::from_config(model, &config.oracle);
            Ok(EquivalenceEngine::new(config, Arc::new(oracle)))
        }
        Err(OracleError::MissingApiKey(var)) => {
            tracing::warn!("{} is not set; running without the oracle", var);
            Ok(EquivalenceEngine::offline(config))
        }
        Err(e) => Err(e.into()),
    }
}
