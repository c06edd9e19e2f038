//! GitHub modpack repository client
//!
//! Bundles live under `modpacks/<name>/` in a single GitHub repository. The
//! listing comes from the contents API; the archive is the branch zipball.

use crate::sync::ArchiveSource;

use serde::Deserialize;
use std::error::Error;
use std::time::Duration;

const API_BASE: &str = "https://api.github.com";
const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";

/// Contents API row; only directories are bundles.
#[derive(Debug, Deserialize)]
struct ContentsEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

pub struct GitHubSource {
    pub repo: String,
    pub branch: String,
    pub token: String,
}

impl GitHubSource {
    /// List available bundle names. Fails soft: on any error a warning is
    /// printed and the list comes back empty.
    pub fn list_bundles(&self) -> Vec<String> {
        match self.list_bundles_inner() {
            Ok(bundles) => bundles,
            Err(e) => {
                eprintln!("[modlink] Could not fetch the modpack list: {e}");
                Vec::new()
            }
        }
    }

    fn list_bundles_inner(&self) -> Result<Vec<String>, Box<dyn Error>> {
        let url = format!("{API_BASE}/repos/{}/contents/modpacks", self.repo);
        let response = self.get(&url)?;

        if !response.status().is_success() {
            return Err(format!("listing failed: HTTP {}", response.status()).into());
        }

        let entries: Vec<ContentsEntry> = response.json()?;
        Ok(entries
            .into_iter()
            .filter(|e| e.kind == "dir")
            .map(|e| e.name)
            .collect())
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, Box<dyn Error>> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("modlink")
            .timeout(Duration::from_secs(120))
            .build()?;

        let mut request = client.get(url).header("Accept", ACCEPT_HEADER);
        if !self.token.is_empty() {
            request = request.header("Authorization", format!("token {}", self.token));
        }
        Ok(request.send()?)
    }
}

impl ArchiveSource for GitHubSource {
    /// Download the branch zipball. Transport errors are fatal to the run.
    fn fetch_archive(&self) -> Result<Vec<u8>, Box<dyn Error>> {
        let url = format!("{API_BASE}/repos/{}/zipball/{}", self.repo, self.branch);
        let response = self.get(&url)?;

        if !response.status().is_success() {
            return Err(format!("archive download failed: HTTP {}", response.status()).into());
        }

        Ok(response.bytes()?.to_vec())
    }
}
