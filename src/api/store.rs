//! Team storage: the model, the store seam, and the in-memory
//! implementation backing it.
//!
//! The trait mirrors the primitives a document store offers (find,
//! insert, partial update, delete, aggregate), so a persistent backend
//! can slot in behind the same handlers.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use utoipa::ToSchema;
use uuid::Uuid;

/// Page size applied when the listing query names none.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Hard page-size ceiling for listings.
pub const MAX_PAGE_SIZE: usize = 200;

const TOP_COLLEGES_LIMIT: usize = 10;

/// One registered participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Participant {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub college: String,
}

/// A registered team as stored and served.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(rename = "_id")]
    pub id: String,
    pub team_name: String,
    pub leader_name: String,
    pub number_of_participants: usize,
    pub participants: Vec<Participant>,
    /// ISO-8601 UTC timestamp; range filters compare it as a string.
    pub registration_date: String,
    pub transaction_id: String,
    pub payment_status: String,
}

/// Incoming team fields for registration. Every field is caller-supplied;
/// only the id is assigned on conversion.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamDraft {
    pub team_name: String,
    pub leader_name: String,
    pub number_of_participants: usize,
    pub participants: Vec<Participant>,
    pub registration_date: String,
    pub payment_status: String,
    pub transaction_id: String,
}

impl Team {
    /// Materialize a draft under a fresh id.
    #[must_use]
    pub fn from_draft(draft: TeamDraft) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            team_name: draft.team_name,
            leader_name: draft.leader_name,
            number_of_participants: draft.number_of_participants,
            participants: draft.participants,
            registration_date: draft.registration_date,
            transaction_id: draft.transaction_id,
            payment_status: draft.payment_status,
        }
    }

    fn matches_search(&self, needle: &str) -> bool {
        self.team_name.to_lowercase().contains(needle)
            || self.leader_name.to_lowercase().contains(needle)
            || self.transaction_id.to_lowercase().contains(needle)
            || self.participants.iter().any(|participant| {
                participant.name.to_lowercase().contains(needle)
                    || participant.college.to_lowercase().contains(needle)
            })
    }
}

/// Whether a string is a well-formed team id.
#[must_use]
pub fn valid_team_id(id: &str) -> bool {
    Uuid::parse_str(id).is_ok()
}

/// Listing filters, sort, and pagination. Values are expected to be
/// normalized by the caller: `limit` capped, `payment_status` of `all`
/// already dropped.
#[derive(Clone, Debug)]
pub struct TeamQuery {
    pub search: Option<String>,
    pub payment_status: Option<String>,
    pub college: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub sort_by: String,
    pub sort_desc: bool,
    pub limit: usize,
    pub offset: usize,
}

impl Default for TeamQuery {
    fn default() -> Self {
        Self {
            search: None,
            payment_status: None,
            college: None,
            date_from: None,
            date_to: None,
            sort_by: "registrationDate".to_string(),
            sort_desc: true,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl TeamQuery {
    fn matches(&self, team: &Team) -> bool {
        if let Some(search) = &self.search {
            if !team.matches_search(&search.to_lowercase()) {
                return false;
            }
        }

        if let Some(payment_status) = &self.payment_status {
            if team.payment_status != *payment_status {
                return false;
            }
        }

        if let Some(college) = &self.college {
            if !team
                .participants
                .iter()
                .any(|participant| participant.college == *college)
            {
                return false;
            }
        }

        if let Some(date_from) = &self.date_from {
            if team.registration_date.as_str() < date_from.as_str() {
                return false;
            }
        }

        if let Some(date_to) = &self.date_to {
            if team.registration_date.as_str() > date_to.as_str() {
                return false;
            }
        }

        true
    }
}

fn compare_by(a: &Team, b: &Team, sort_by: &str) -> Ordering {
    match sort_by {
        "teamName" => a.team_name.cmp(&b.team_name),
        "leaderName" => a.leader_name.cmp(&b.leader_name),
        "numberOfParticipants" => a.number_of_participants.cmp(&b.number_of_participants),
        "transactionId" => a.transaction_id.cmp(&b.transaction_id),
        "paymentStatus" => a.payment_status.cmp(&b.payment_status),
        _ => a.registration_date.cmp(&b.registration_date),
    }
}

/// One listing page plus the total match count before pagination.
#[derive(Clone, Debug)]
pub struct TeamPage {
    pub teams: Vec<Team>,
    pub total: usize,
}

/// Aggregate registration statistics.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub total_teams: usize,
    pub paid_teams: usize,
    pub unpaid_teams: usize,
    pub registrations_by_date: Vec<DateCount>,
    pub top_colleges: Vec<CollegeCount>,
}

/// Registrations on one calendar day.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DateCount {
    pub date: String,
    pub count: usize,
}

/// Participant count for one college.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CollegeCount {
    pub college: String,
    pub count: usize,
}

/// Storage seam for team data.
pub trait TeamStore: Send + Sync {
    /// Filtered, sorted, paginated view plus the total match count.
    fn list(&self, query: &TeamQuery) -> Result<TeamPage>;

    fn get(&self, id: &str) -> Result<Option<Team>>;

    fn find_by_transaction(&self, transaction_id: &str) -> Result<Option<Team>>;

    fn insert(&self, team: Team) -> Result<()>;

    /// Apply a partial update, leaving absent fields alone. Returns the
    /// updated team, or `None` for an unknown id.
    fn update(&self, id: &str, changes: &Map<String, Value>) -> Result<Option<Team>>;

    /// Returns the number of teams removed.
    fn delete(&self, id: &str) -> Result<usize>;

    fn delete_many(&self, ids: &[String]) -> Result<usize>;

    fn set_payment_status(&self, ids: &[String], payment_status: &str) -> Result<usize>;

    fn fetch_many(&self, ids: &[String]) -> Result<Vec<Team>>;

    fn fetch_all(&self) -> Result<Vec<Team>>;

    fn stats(&self) -> Result<TeamStats>;
}

/// Process-local team store. Contents are lost on restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryTeamStore {
    teams: Arc<RwLock<Vec<Team>>>,
}

impl MemoryTeamStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Team>>> {
        self.teams
            .read()
            .map_err(|_| anyhow!("team store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Team>>> {
        self.teams
            .write()
            .map_err(|_| anyhow!("team store lock poisoned"))
    }
}

impl TeamStore for MemoryTeamStore {
    fn list(&self, query: &TeamQuery) -> Result<TeamPage> {
        let teams = self.read()?;

        let mut matches: Vec<Team> = teams
            .iter()
            .filter(|team| query.matches(team))
            .cloned()
            .collect();

        let total = matches.len();

        matches.sort_by(|a, b| {
            let ordering = compare_by(a, b, &query.sort_by);

            if query.sort_desc {
                ordering.reverse()
            } else {
                ordering
            }
        });

        let teams = matches
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();

        Ok(TeamPage { teams, total })
    }

    fn get(&self, id: &str) -> Result<Option<Team>> {
        let teams = self.read()?;

        Ok(teams.iter().find(|team| team.id == id).cloned())
    }

    fn find_by_transaction(&self, transaction_id: &str) -> Result<Option<Team>> {
        let teams = self.read()?;

        Ok(teams
            .iter()
            .find(|team| team.transaction_id == transaction_id)
            .cloned())
    }

    fn insert(&self, team: Team) -> Result<()> {
        let mut teams = self.write()?;

        teams.push(team);

        Ok(())
    }

    fn update(&self, id: &str, changes: &Map<String, Value>) -> Result<Option<Team>> {
        let mut teams = self.write()?;

        let Some(position) = teams.iter().position(|team| team.id == id) else {
            return Ok(None);
        };

        let mut value = serde_json::to_value(&teams[position])?;

        if let Some(fields) = value.as_object_mut() {
            for (key, change) in changes {
                fields.insert(key.clone(), change.clone());
            }
        }

        let updated: Team = serde_json::from_value(value)?;
        teams[position] = updated.clone();

        Ok(Some(updated))
    }

    fn delete(&self, id: &str) -> Result<usize> {
        let mut teams = self.write()?;

        let before = teams.len();
        teams.retain(|team| team.id != id);

        Ok(before - teams.len())
    }

    fn delete_many(&self, ids: &[String]) -> Result<usize> {
        let mut teams = self.write()?;

        let before = teams.len();
        teams.retain(|team| !ids.contains(&team.id));

        Ok(before - teams.len())
    }

    fn set_payment_status(&self, ids: &[String], payment_status: &str) -> Result<usize> {
        let mut teams = self.write()?;

        let mut updated = 0;

        for team in teams.iter_mut() {
            if ids.contains(&team.id) {
                team.payment_status = payment_status.to_string();
                updated += 1;
            }
        }

        Ok(updated)
    }

    fn fetch_many(&self, ids: &[String]) -> Result<Vec<Team>> {
        let teams = self.read()?;

        Ok(teams
            .iter()
            .filter(|team| ids.contains(&team.id))
            .cloned()
            .collect())
    }

    fn fetch_all(&self) -> Result<Vec<Team>> {
        let teams = self.read()?;

        Ok(teams.clone())
    }

    fn stats(&self) -> Result<TeamStats> {
        let teams = self.read()?;

        let total_teams = teams.len();
        let paid_teams = teams
            .iter()
            .filter(|team| team.payment_status == "Paid")
            .count();
        let unpaid_teams = teams
            .iter()
            .filter(|team| team.payment_status == "Unpaid")
            .count();

        let mut by_date: HashMap<String, usize> = HashMap::new();

        for team in teams.iter() {
            let date: String = team.registration_date.chars().take(10).collect();
            *by_date.entry(date).or_insert(0) += 1;
        }

        let mut registrations_by_date: Vec<DateCount> = by_date
            .into_iter()
            .map(|(date, count)| DateCount { date, count })
            .collect();
        registrations_by_date.sort_by(|a, b| a.date.cmp(&b.date));

        let mut colleges: HashMap<String, usize> = HashMap::new();

        for team in teams.iter() {
            for participant in &team.participants {
                if !participant.college.is_empty() {
                    *colleges.entry(participant.college.clone()).or_insert(0) += 1;
                }
            }
        }

        let mut top_colleges: Vec<CollegeCount> = colleges
            .into_iter()
            .map(|(college, count)| CollegeCount { college, count })
            .collect();
        top_colleges.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.college.cmp(&b.college))
        });
        top_colleges.truncate(TOP_COLLEGES_LIMIT);

        Ok(TeamStats {
            total_teams,
            paid_teams,
            unpaid_teams,
            registrations_by_date,
            top_colleges,
        })
    }
}
