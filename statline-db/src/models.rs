use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Length of every issued API key.
pub const API_KEY_LEN: usize = 24;

/// Smallest roster a team may field.
pub const ROSTER_MIN: usize = 5;
/// Largest roster a team may field.
pub const ROSTER_MAX: usize = 16;

/// Invariant violations raised when constructing a domain entity.
///
/// Entities are immutable once built, so this is the only place a bad value
/// can be rejected.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
  #[error("player name cannot be empty")]
  PlayerNameEmpty,

  #[error("player location cannot be empty")]
  PlayerLocationEmpty,

  #[error("player statistics cannot be negative (got {0})")]
  NegativeStatistic(i64),

  #[error("api key must be at least {API_KEY_LEN} characters (got {0})")]
  KeyTooShort(usize),

  #[error("team name cannot be empty")]
  TeamNameEmpty,

  #[error("team id must be nonzero")]
  TeamIdZero,

  #[error("team {0} is not valid")]
  TeamInvalid(String),

  #[error("roster must hold between {ROSTER_MIN} and {ROSTER_MAX} players (got {0})")]
  RosterSize(usize),
}

/// Access level attached to an API key.
///
/// `Guest` keys may only read; `Admin` keys get the full verb set. Stored as
/// an integer column where only an exact `1` reads back as `Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
  Guest,
  Admin,
}

impl Permission {
  /// Decode the stored integer. Anything other than exactly 1 is a guest.
  pub fn from_stored(value: i64) -> Self {
    if value == 1 { Self::Admin } else { Self::Guest }
  }

  /// The integer persisted in the `Keys.permissions` column.
  pub fn as_stored(self) -> i64 {
    match self {
      Self::Guest => 0,
      Self::Admin => 1,
    }
  }
}

impl fmt::Display for Permission {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Guest => write!(f, "GUEST"),
      Self::Admin => write!(f, "ADMIN"),
    }
  }
}

impl Serialize for Permission {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(self.as_stored())
  }
}

/// A competitor on one regional server.
///
/// Field names double as the wire names, so the struct serializes straight
/// into the response envelope. `player_id` 0 means the row has not been
/// persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
  player_name: String,
  player_location: String,
  player_id: i64,
  player_wins: i64,
  player_draws: i64,
  player_losses: i64,
  player_points: i64,
}

impl Player {
  /// Build a player, rejecting any field that breaks an invariant before it
  /// is observable. The location is normalized to upper case; names keep
  /// their original casing and match case-insensitively at the storage layer.
  pub fn new(
    name: impl Into<String>,
    location: impl Into<String>,
    id: i64,
    wins: i64,
    draws: i64,
    losses: i64,
    points: i64,
  ) -> Result<Self, ValidationError> {
    let name = name.into();
    let location = location.into();

    if name.is_empty() {
      return Err(ValidationError::PlayerNameEmpty);
    }
    if location.is_empty() {
      return Err(ValidationError::PlayerLocationEmpty);
    }
    for stat in [wins, draws, losses, points] {
      if stat < 0 {
        return Err(ValidationError::NegativeStatistic(stat));
      }
    }

    Ok(Self {
      player_name: name,
      player_location: location.to_ascii_uppercase(),
      player_id: id,
      player_wins: wins,
      player_draws: draws,
      player_losses: losses,
      player_points: points,
    })
  }

  /// Build a player that has not been assigned a row id yet.
  pub fn unsaved(
    name: impl Into<String>,
    location: impl Into<String>,
    wins: i64,
    draws: i64,
    losses: i64,
    points: i64,
  ) -> Result<Self, ValidationError> {
    Self::new(name, location, 0, wins, draws, losses, points)
  }

  /// Copy of this player carrying the given row id.
  pub fn with_id(&self, id: i64) -> Self {
    let mut player = self.clone();
    player.player_id = id;
    player
  }

  /// Re-check the construction invariants against the current state.
  pub fn is_valid(&self) -> bool {
    !self.player_name.is_empty()
      && !self.player_location.is_empty()
      && self.player_wins >= 0
      && self.player_draws >= 0
      && self.player_losses >= 0
      && self.player_points >= 0
  }

  pub fn name(&self) -> &str {
    &self.player_name
  }

  pub fn location(&self) -> &str {
    &self.player_location
  }

  pub fn id(&self) -> i64 {
    self.player_id
  }

  pub fn wins(&self) -> i64 {
    self.player_wins
  }

  pub fn draws(&self) -> i64 {
    self.player_draws
  }

  pub fn losses(&self) -> i64 {
    self.player_losses
  }

  pub fn points(&self) -> i64 {
    self.player_points
  }
}

/// The players fielded by one team, between [`ROSTER_MIN`] and
/// [`ROSTER_MAX`] strong. Owned exclusively by its team.
#[derive(Debug, Clone)]
pub struct Roster {
  players: Vec<Player>,
}

impl Roster {
  pub fn new(players: Vec<Player>) -> Result<Self, ValidationError> {
    if players.len() < ROSTER_MIN || players.len() > ROSTER_MAX {
      return Err(ValidationError::RosterSize(players.len()));
    }
    Ok(Self { players })
  }

  pub fn is_valid(&self) -> bool {
    (ROSTER_MIN..=ROSTER_MAX).contains(&self.players.len())
  }

  pub fn players(&self) -> &[Player] {
    &self.players
  }

  pub fn len(&self) -> usize {
    self.players.len()
  }

  pub fn is_empty(&self) -> bool {
    self.players.is_empty()
  }
}

/// A team and its aggregate record. Not exposed over HTTP yet; games and
/// teams are recorded per player for now.
#[derive(Debug, Clone)]
pub struct Team {
  name: String,
  id: i64,
  wins: i64,
  draws: i64,
  losses: i64,
  roster: Roster,
}

impl Team {
  pub fn new(
    name: impl Into<String>,
    id: i64,
    wins: i64,
    draws: i64,
    losses: i64,
    roster: Roster,
  ) -> Result<Self, ValidationError> {
    let name = name.into();

    if name.is_empty() {
      return Err(ValidationError::TeamNameEmpty);
    }
    if id == 0 {
      return Err(ValidationError::TeamIdZero);
    }
    for stat in [wins, draws, losses] {
      if stat < 0 {
        return Err(ValidationError::NegativeStatistic(stat));
      }
    }
    if !roster.is_valid() {
      return Err(ValidationError::RosterSize(roster.len()));
    }

    Ok(Self {
      name,
      id,
      wins,
      draws,
      losses,
      roster,
    })
  }

  pub fn is_valid(&self) -> bool {
    !self.name.is_empty()
      && self.id != 0
      && self.wins >= 0
      && self.draws >= 0
      && self.losses >= 0
      && self.roster.is_valid()
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn id(&self) -> i64 {
    self.id
  }

  pub fn roster(&self) -> &Roster {
    &self.roster
  }
}

/// Outcome of a game from the home team's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
  HomeWin,
  AwayWin,
  Draw,
}

/// One match between two teams. The outcome is carried as a pair of win
/// flags; both flags agreeing (either way) reads as a draw.
#[derive(Debug, Clone)]
pub struct Game {
  home: Team,
  away: Team,
  home_won: bool,
  away_won: bool,
}

impl Game {
  pub fn new(home: Team, away: Team, home_won: bool, away_won: bool) -> Result<Self, ValidationError> {
    if !home.is_valid() {
      return Err(ValidationError::TeamInvalid(home.name().to_string()));
    }
    if !away.is_valid() {
      return Err(ValidationError::TeamInvalid(away.name().to_string()));
    }
    Ok(Self {
      home,
      away,
      home_won,
      away_won,
    })
  }

  pub fn is_valid(&self) -> bool {
    self.home.is_valid() && self.away.is_valid()
  }

  pub fn result(&self) -> GameResult {
    match (self.home_won, self.away_won) {
      (true, false) => GameResult::HomeWin,
      (false, true) => GameResult::AwayWin,
      _ => GameResult::Draw,
    }
  }

  pub fn home(&self) -> &Team {
    &self.home
  }

  pub fn away(&self) -> &Team {
    &self.away
  }
}

/// An issued API key and its access level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Key {
  key: String,
  permission: Permission,
}

impl Key {
  pub fn new(key: impl Into<String>, permission: Permission) -> Result<Self, ValidationError> {
    let key = key.into();
    if key.len() < API_KEY_LEN {
      return Err(ValidationError::KeyTooShort(key.len()));
    }
    Ok(Self { key, permission })
  }

  pub fn is_valid(&self) -> bool {
    self.key.len() >= API_KEY_LEN
  }

  pub fn key(&self) -> &str {
    &self.key
  }

  pub fn permission(&self) -> Permission {
    self.permission
  }
}
