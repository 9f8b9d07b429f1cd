use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_POLL_OPTIONS: usize = 2;
pub const MAX_POLL_OPTIONS: usize = 5;
pub const MAX_QUESTION_LEN: usize = 200;
pub const MAX_OPTION_LEN: usize = 100;

/// Why a poll operation was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("{0}")]
    Invalid(String),

    #[error("poll is no longer active")]
    Closed,

    /// The end time had passed when the vote arrived. The poll has been
    /// flipped to inactive as a side effect.
    #[error("poll has ended")]
    Expired,

    #[error("invalid option index {index}: poll has {options} options")]
    InvalidOption { index: usize, options: usize },

    #[error("you have already voted on this poll")]
    AlreadyVoted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PollVote {
    pub user: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    pub text: String,
    #[serde(default)]
    pub votes: Vec<PollVote>,
    /// Always `votes.len()`.
    #[serde(default)]
    pub vote_count: usize,
}

/// A poll attached to a blog.
///
/// A user appears in at most one option's `votes` across the whole poll.
/// Once `is_active` is false it never becomes true again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub question: String,
    pub options: Vec<PollOption>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Input for attaching a poll to a blog.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoll {
    pub question: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

/// Input for a vote. Signed so a negative index is a validation error
/// rather than a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVote {
    pub option_index: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptionResult {
    pub text: String,
    pub vote_count: usize,
    /// Rounded independently per option, so the column may not sum to 100.
    pub percentage: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PollResults {
    pub question: String,
    pub options: Vec<OptionResult>,
    pub total_votes: usize,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    /// Option index the viewer voted for, if any.
    pub user_voted: Option<usize>,
}

impl Poll {
    /// Build a new active poll. Question and option texts are trimmed.
    pub fn new(input: CreatePoll, now: DateTime<Utc>) -> Result<Self, PollError> {
        let question = input.question.trim().to_string();
        if question.is_empty() {
            return Err(PollError::Invalid("poll question is required".into()));
        }
        if question.chars().count() > MAX_QUESTION_LEN {
            return Err(PollError::Invalid(format!(
                "poll question must be at most {} characters",
                MAX_QUESTION_LEN
            )));
        }
        if !(MIN_POLL_OPTIONS..=MAX_POLL_OPTIONS).contains(&input.options.len()) {
            return Err(PollError::Invalid(format!(
                "a poll needs between {} and {} options",
                MIN_POLL_OPTIONS, MAX_POLL_OPTIONS
            )));
        }

        let mut options = Vec::with_capacity(input.options.len());
        for text in input.options {
            let text = text.trim().to_string();
            if text.is_empty() {
                return Err(PollError::Invalid("poll options cannot be empty".into()));
            }
            if text.chars().count() > MAX_OPTION_LEN {
                return Err(PollError::Invalid(format!(
                    "poll options must be at most {} characters",
                    MAX_OPTION_LEN
                )));
            }
            options.push(PollOption {
                text,
                votes: Vec::new(),
                vote_count: 0,
            });
        }

        Ok(Self {
            question,
            options,
            is_active: true,
            ends_at: input.ends_at,
            created_at: now,
        })
    }

    /// Index of the option `user` voted for.
    pub fn voted_option(&self, user: &str) -> Option<usize> {
        self.options
            .iter()
            .position(|o| o.votes.iter().any(|v| v.user == user))
    }

    pub fn total_votes(&self) -> usize {
        self.options.iter().map(|o| o.vote_count).sum()
    }

    /// Flip to inactive if the end time has passed. Returns true if it flipped.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        match self.ends_at {
            Some(ends_at) if self.is_active && now > ends_at => {
                self.is_active = false;
                true
            }
            _ => false,
        }
    }

    /// Record `user`'s vote for option `index`.
    ///
    /// On `Expired` the poll has been mutated (`is_active = false`) and the
    /// caller should persist it before reporting the error.
    pub fn vote(&mut self, user: &str, index: usize, now: DateTime<Utc>) -> Result<(), PollError> {
        if !self.is_active {
            return Err(PollError::Closed);
        }
        if self.expire_if_due(now) {
            return Err(PollError::Expired);
        }
        if index >= self.options.len() {
            return Err(PollError::InvalidOption {
                index,
                options: self.options.len(),
            });
        }
        if self.voted_option(user).is_some() {
            return Err(PollError::AlreadyVoted);
        }

        let option = &mut self.options[index];
        option.votes.push(PollVote {
            user: user.to_string(),
            created_at: now,
        });
        option.vote_count = option.votes.len();
        Ok(())
    }

    /// End the poll permanently. Ending an ended poll is a no-op.
    pub fn end(&mut self) {
        self.is_active = false;
    }

    pub fn results(&self, viewer: Option<&str>) -> PollResults {
        let total = self.total_votes();
        let options = self
            .options
            .iter()
            .map(|o| OptionResult {
                text: o.text.clone(),
                vote_count: o.vote_count,
                percentage: percentage(o.vote_count, total),
            })
            .collect();

        PollResults {
            question: self.question.clone(),
            options,
            total_votes: total,
            is_active: self.is_active,
            ends_at: self.ends_at,
            user_voted: viewer.and_then(|u| self.voted_option(u)),
        }
    }
}

fn percentage(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (count as f64 * 100.0 / total as f64).round() as u32
}
