//! `sled`-backed `SkillVerdictStore`: the `analyzed_skills` table, upserted by
//! `code_hash`.

use async_trait::async_trait;
use clawshield_skills::{Result, SkillAnalysisResult, SkillError, SkillVerdictStore};
use serde::{Deserialize, Serialize};

use crate::storage::Storage;

#[derive(Serialize, Deserialize)]
struct VerdictRow {
    language: String,
    result: SkillAnalysisResult,
}

#[async_trait]
impl SkillVerdictStore for Storage {
    async fn find_by_hash(&self, code_hash: &str) -> Result<Option<SkillAnalysisResult>> {
        let Some(bytes) = self
            .analyzed_skills
            .get(code_hash.as_bytes())
            .map_err(|e| SkillError::Store(e.to_string()))?
        else {
            return Ok(None);
        };
        let row: VerdictRow = serde_json::from_slice(&bytes)?;
        Ok(Some(row.result))
    }

    async fn upsert(&self, code_hash: &str, language: &str, result: &SkillAnalysisResult) -> Result<()> {
        let row = VerdictRow {
            language: language.to_string(),
            result: result.clone(),
        };
        let bytes = serde_json::to_vec(&row)?;
        self.analyzed_skills
            .insert(code_hash.as_bytes(), bytes)
            .map_err(|e| SkillError::Store(e.to_string()))?;
        Ok(())
    }
}
