//! JSON wire messages exchanged with the game gateway over the realtime
//! channel. One message per semantic event, externally tagged with `type`.

use serde::{Deserialize, Serialize};

use crate::player::LiveBet;

/// Server-to-client notifications.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notification {
    /// Pre-round countdown tick, one per second.
    #[serde(rename = "countdown")]
    Countdown { time: u32 },
    /// A new round started. The flag reports whether the server still
    /// accepts bets; older gateways omit it, which means closed.
    #[serde(rename = "gameStart")]
    RoundStart {
        #[serde(rename = "bettingOpen", default)]
        betting_open: bool,
    },
    /// Coarse multiplier tick while the round is running.
    #[serde(rename = "multiplierUpdate")]
    MultiplierTick { multiplier: f64 },
    /// The round crashed.
    #[serde(rename = "gameEnd")]
    RoundEnd,
    /// Whether new bets may currently be placed.
    #[serde(rename = "betAcceptance")]
    BetAcceptance { open: bool },
    /// Whether the player's active bet may currently be cashed out.
    #[serde(rename = "cashoutAllowed")]
    CashoutAllowance { allowed: bool },
    /// Settlement outcome for the player's own bet.
    #[serde(rename = "betResult")]
    BetResult { win: bool, amount: f64 },
    /// The public list of bets riding on the current round.
    #[serde(rename = "userList")]
    UserList { users: Vec<LiveBet> },
    /// Server-reported error; surfaced to the player, never fatal.
    #[serde(rename = "error")]
    Error { message: String },
}

/// Client-to-server intents. Fire-and-forget; the server remains the
/// authority and may independently reject either.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Intent {
    #[serde(rename = "placeBet")]
    PlaceBet {
        #[serde(rename = "userId")]
        user_id: u64,
        username: String,
        amount: f64,
    },
    #[serde(rename = "cashout")]
    CashOut {
        #[serde(rename = "userId")]
        user_id: u64,
        multiplier: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_tags() {
        let countdown: Notification =
            serde_json::from_str(r#"{"type":"countdown","time":9}"#).unwrap();
        assert_eq!(countdown, Notification::Countdown { time: 9 });

        let tick: Notification =
            serde_json::from_str(r#"{"type":"multiplierUpdate","multiplier":1.37}"#).unwrap();
        assert_eq!(tick, Notification::MultiplierTick { multiplier: 1.37 });

        let end: Notification = serde_json::from_str(r#"{"type":"gameEnd"}"#).unwrap();
        assert_eq!(end, Notification::RoundEnd);
    }

    #[test]
    fn test_bare_game_start_means_betting_closed() {
        let start: Notification = serde_json::from_str(r#"{"type":"gameStart"}"#).unwrap();
        assert_eq!(
            start,
            Notification::RoundStart {
                betting_open: false
            }
        );

        let open: Notification =
            serde_json::from_str(r#"{"type":"gameStart","bettingOpen":true}"#).unwrap();
        assert_eq!(open, Notification::RoundStart { betting_open: true });
    }

    #[test]
    fn test_place_bet_wire_shape() {
        let intent = Intent::PlaceBet {
            user_id: 1,
            username: "Player1".to_string(),
            amount: 100.0,
        };
        let raw = serde_json::to_value(&intent).unwrap();
        assert_eq!(raw.get("type").unwrap(), "placeBet");
        assert_eq!(raw.get("userId").unwrap(), 1);
        assert_eq!(raw.get("username").unwrap(), "Player1");
        assert_eq!(raw.get("amount").unwrap().as_f64(), Some(100.0));
    }

    #[test]
    fn test_cashout_wire_shape() {
        let intent = Intent::CashOut {
            user_id: 1,
            multiplier: 1.85,
        };
        let raw = serde_json::to_value(&intent).unwrap();
        assert_eq!(raw.get("type").unwrap(), "cashout");
        assert_eq!(raw.get("multiplier").unwrap().as_f64(), Some(1.85));
    }
}
