//! `sled`-backed `MalwareSignatureStore`: a flat table of configured signatures,
//! the skill analyzer's hash/pattern match table.

use async_trait::async_trait;
use clawshield_skills::{MalwareSignature, MalwareSignatureStore, Result, SkillError};

use crate::storage::Storage;

impl Storage {
    pub fn put_malware_signature(&self, signature: &MalwareSignature) -> crate::error::Result<()> {
        let bytes = serde_json::to_vec(signature)?;
        self.malware_signatures.insert(signature.id.as_bytes(), bytes)?;
        Ok(())
    }
}

#[async_trait]
impl MalwareSignatureStore for Storage {
    async fn load_enabled_signatures(&self) -> Result<Vec<MalwareSignature>> {
        let mut signatures = Vec::new();
        for entry in self.malware_signatures.iter() {
            let (_, bytes) = entry.map_err(|e| SkillError::Store(e.to_string()))?;
            let signature: MalwareSignature = serde_json::from_slice(&bytes)?;
            signatures.push(signature);
        }
        Ok(signatures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clawshield_firewall::Severity;

    fn sample_signature(id: &str) -> MalwareSignature {
        MalwareSignature {
            id: id.to_string(),
            name: "known-backdoor".to_string(),
            content_hash: Some("deadbeef".to_string()),
            pattern: None,
            severity: Severity::Critical,
            description: "test signature".to_string(),
        }
    }

    #[tokio::test]
    async fn stored_signatures_are_listed() {
        let storage = Storage::temporary().unwrap();
        storage.put_malware_signature(&sample_signature("s1")).unwrap();
        let loaded = storage.load_enabled_signatures().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "s1");
    }
}
