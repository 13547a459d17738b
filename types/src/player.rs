//! Player identity, live-bet, and settled-bet records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity attached to outbound intents; obtained from the login boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerIdentity {
    pub user_id: u64,
    pub username: String,
}

/// Opaque session payload returned by the login endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(flatten)]
    pub identity: PlayerIdentity,
    pub token: String,
}

/// One entry in the public list of bets riding on the current round.
/// `cashout_at` stays `None` until the player locks in a multiplier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBet {
    pub id: u64,
    pub username: String,
    pub amount: f64,
    pub cashout_at: Option<f64>,
}

/// Outcome tag on a settled-bet history record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetOutcome {
    Win,
    Lose,
}

/// A settled bet as served by the history endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettledBet {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub round_id: String,
    pub amount: f64,
    /// The multiplier locked in at cash-out; zero when the bet rode into the
    /// crash.
    pub odds: f64,
    pub win_amount: f64,
    pub crash_point: f64,
    pub result: BetOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_flattens_identity() {
        let session: Session =
            serde_json::from_str(r#"{"userId":7,"username":"Player7","token":"tok-7"}"#).unwrap();
        assert_eq!(session.identity.user_id, 7);
        assert_eq!(session.identity.username, "Player7");
        assert_eq!(session.token, "tok-7");
    }

    #[test]
    fn test_live_bet_pending_cashout_is_null() {
        let bet = LiveBet {
            id: 1,
            username: "Player1".to_string(),
            amount: 100.0,
            cashout_at: None,
        };
        let raw = serde_json::to_value(&bet).unwrap();
        assert!(raw.get("cashoutAt").unwrap().is_null());
    }

    #[test]
    fn test_settled_bet_round_trips_camel_case() {
        let raw = r#"{
            "id": "bet-1",
            "createdAt": "2025-03-01T12:00:00Z",
            "roundId": "round-9",
            "amount": 25.0,
            "odds": 1.8,
            "winAmount": 45.0,
            "crashPoint": 2.31,
            "result": "win"
        }"#;
        let bet: SettledBet = serde_json::from_str(raw).unwrap();
        assert_eq!(bet.result, BetOutcome::Win);
        assert_eq!(bet.crash_point, 2.31);
        let encoded = serde_json::to_value(&bet).unwrap();
        assert_eq!(encoded.get("winAmount").unwrap().as_f64(), Some(45.0));
    }
}
