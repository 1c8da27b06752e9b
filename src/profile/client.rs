use crate::shared::local_store::LocalStore;
use crate::shared::names::guest_name;
use anyhow::Context;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;

const PLAYER_ID_KEY: &str = "playerId";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub games_played: i64,
  #[serde(default)]
  pub high_score: i64,
  #[serde(default)]
  pub total_score: i64,
}

/// HTTP client for the profile service. Game clients call it at startup and
/// after each finished game; every call degrades gracefully when the service
/// is unreachable.
#[derive(Clone)]
pub struct ProfileClient {
  http: reqwest::Client,
  base_url: String,
}

impl ProfileClient {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      http: reqwest::Client::new(),
      base_url: base_url.into(),
    }
  }

  pub async fn create_player(&self, name: &str) -> anyhow::Result<Profile> {
    let response = self
      .http
      .post(format!("{}/api/players", self.base_url))
      .json(&json!({ "name": name }))
      .send()
      .await
      .context("profile service unreachable")?;
    response
      .error_for_status()
      .context("create player rejected")?
      .json::<Profile>()
      .await
      .context("malformed profile response")
  }

  pub async fn fetch_player(&self, id: &str) -> anyhow::Result<Option<Profile>> {
    let response = self
      .http
      .get(format!("{}/api/players/{id}", self.base_url))
      .send()
      .await
      .context("profile service unreachable")?;
    if response.status() == reqwest::StatusCode::NOT_FOUND {
      return Ok(None);
    }
    let profile = response
      .error_for_status()
      .context("fetch player rejected")?
      .json::<Profile>()
      .await
      .context("malformed profile response")?;
    Ok(Some(profile))
  }

  pub async fn record_session(
    &self,
    player_id: &str,
    mode: &str,
    score: i64,
    duration_ms: i64,
  ) -> anyhow::Result<()> {
    self
      .http
      .post(format!("{}/api/sessions", self.base_url))
      .json(&json!({
        "playerId": player_id,
        "mode": mode,
        "score": score,
        "durationMs": duration_ms,
      }))
      .send()
      .await
      .context("profile service unreachable")?
      .error_for_status()
      .context("record session rejected")?;
    Ok(())
  }

  pub async fn rename_player(&self, id: &str, name: &str) -> anyhow::Result<()> {
    self
      .http
      .put(format!("{}/api/players/{id}", self.base_url))
      .json(&json!({ "name": name }))
      .send()
      .await
      .context("profile service unreachable")?
      .error_for_status()
      .context("rename rejected")?;
    Ok(())
  }

  pub async fn leaderboard(&self, limit: usize) -> anyhow::Result<serde_json::Value> {
    let response = self
      .http
      .get(format!("{}/api/leaderboard?limit={limit}", self.base_url))
      .send()
      .await
      .context("profile service unreachable")?;
    response
      .error_for_status()
      .context("leaderboard rejected")?
      .json()
      .await
      .context("malformed leaderboard response")
  }

  pub async fn stats(&self) -> anyhow::Result<serde_json::Value> {
    let response = self
      .http
      .get(format!("{}/api/stats", self.base_url))
      .send()
      .await
      .context("profile service unreachable")?;
    response
      .error_for_status()
      .context("stats rejected")?
      .json()
      .await
      .context("malformed stats response")
  }

  /// Resolves the local identity: reuse the saved player id when the service
  /// still knows it, otherwise create a fresh profile and save the id. When
  /// the service cannot be reached at all, play continues under a throwaway
  /// guest profile that is never persisted.
  pub async fn fetch_or_guest(&self, local: &LocalStore, rng: &mut impl Rng) -> Profile {
    if let Some(saved) = local.get(PLAYER_ID_KEY) {
      match self.fetch_player(&saved).await {
        Ok(Some(profile)) => return profile,
        Ok(None) => local.remove(PLAYER_ID_KEY),
        Err(error) => {
          tracing::warn!(%error, "profile service offline, playing as guest");
          return guest_profile(rng);
        }
      }
    }

    let name = guest_name(rng);
    match self.create_player(&name).await {
      Ok(profile) => {
        if let Err(error) = local.set(PLAYER_ID_KEY, &profile.id) {
          tracing::warn!(%error, "failed to persist player id");
        }
        profile
      }
      Err(error) => {
        tracing::warn!(%error, "profile service offline, playing as guest");
        guest_profile(rng)
      }
    }
  }
}

fn guest_profile(rng: &mut impl Rng) -> Profile {
  Profile {
    id: format!("guest-{}", uuid::Uuid::new_v4()),
    name: guest_name(rng),
    games_played: 0,
    high_score: 0,
    total_score: 0,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  #[tokio::test]
  async fn unreachable_service_falls_back_to_guest() {
    let mut rng = StdRng::seed_from_u64(5);
    let dir = std::env::temp_dir().join(format!("profile-client-{}", uuid::Uuid::new_v4()));
    let local = LocalStore::new(dir).expect("store dir");
    // Nothing listens on this port.
    let client = ProfileClient::new("http://127.0.0.1:1");

    let profile = client.fetch_or_guest(&local, &mut rng).await;
    assert!(profile.id.starts_with("guest-"));
    assert!(profile.name.starts_with("Guest"));
    // Guest identities are not persisted for reuse.
    assert_eq!(local.get(PLAYER_ID_KEY), None);
  }
}
