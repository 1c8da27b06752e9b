use rand::Rng;

pub const MAX_PLAYER_NAME_LENGTH: usize = 20;

pub fn sanitize_player_name(name: &str, fallback: &str) -> String {
  let cleaned = name.split_whitespace().collect::<Vec<_>>().join(" ");
  if cleaned.is_empty() {
    return fallback.to_string();
  }
  cleaned.chars().take(MAX_PLAYER_NAME_LENGTH).collect()
}

/// Placeholder identity used when the profile service is unreachable.
pub fn guest_name(rng: &mut impl Rng) -> String {
  format!("Guest{}", rng.gen_range(1000..10000))
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  #[test]
  fn sanitize_collapses_whitespace_and_truncates() {
    assert_eq!(sanitize_player_name("  alice   b  ", "x"), "alice b");
    assert_eq!(sanitize_player_name("   ", "Guest1"), "Guest1");
    let long = "a".repeat(40);
    assert_eq!(sanitize_player_name(&long, "x").len(), MAX_PLAYER_NAME_LENGTH);
  }

  #[test]
  fn guest_names_carry_four_digits() {
    let mut rng = StdRng::seed_from_u64(1);
    let name = guest_name(&mut rng);
    assert!(name.starts_with("Guest"));
    assert_eq!(name.len(), "Guest".len() + 4);
  }
}
