use std::collections::BTreeMap;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::answers::{AnswerSet, ValidationResult};
use crate::pages::{Page, survey_pages};
use crate::response::{ItemResponse, ResponseContext, SurveyContext};
use crate::spec::survey::Survey;
use crate::validate::validate_page;

/// Page position as encoded in the trailing segment of a navigation URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAddress {
    /// The URL does not point into the pages path.
    Unaddressed,
    Index(i64),
    /// The trailing segment is not an integer.
    Malformed,
}

/// Reads the page index from `url`, e.g. `/surveys/weekly/pages/2`.
pub fn parse_page_index(url: &str, pages_path: &str) -> PageAddress {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let prefix = format!("{}/", pages_path.trim_end_matches('/'));
    let Some(position) = path.find(&prefix) else {
        return PageAddress::Unaddressed;
    };
    let rest = path[position + prefix.len()..].trim_end_matches('/');
    match rest.rsplit('/').next().map(str::parse::<i64>) {
        Some(Ok(index)) => PageAddress::Index(index),
        _ => PageAddress::Malformed,
    }
}

pub fn page_url(pages_path: &str, index: usize) -> String {
    format!("{}/{}", pages_path.trim_end_matches('/'), index)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationState {
    AtPage(usize),
    /// The requested index was out of range; the view must go to page 0.
    Redirecting,
    /// No page is currently visible.
    Empty,
}

impl NavigationState {
    /// Page the view should show after any redirect.
    pub fn target(&self) -> Option<usize> {
        match self {
            NavigationState::AtPage(index) => Some(*index),
            NavigationState::Redirecting => Some(0),
            NavigationState::Empty => None,
        }
    }
}

/// Applies the `0 <= index < page_count` rule to a requested address.
pub fn resolve_index(address: PageAddress, page_count: usize) -> NavigationState {
    if page_count == 0 {
        return NavigationState::Empty;
    }
    match address {
        PageAddress::Unaddressed => NavigationState::AtPage(0),
        PageAddress::Index(index) if index >= 0 && (index as u64) < page_count as u64 => {
            NavigationState::AtPage(index as usize)
        }
        PageAddress::Index(_) | PageAddress::Malformed => NavigationState::Redirecting,
    }
}

/// Result of a navigation action.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Moved { to: usize, reset_scroll: bool },
    /// Hard validation failed on the current page; nothing moved.
    Blocked(ValidationResult),
    Submitted(AnswerSet),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("page {index} is out of range ({count} pages)")]
    OutOfRange { index: usize, count: usize },
    #[error("survey '{0}' was already submitted")]
    AlreadySubmitted(String),
}

/// One respondent's pass through a survey.
///
/// Owns the definition and the response context; the page list is derived
/// from both on every call, so it always reflects the latest responses.
#[derive(Debug, Clone)]
pub struct SurveySession {
    survey: Survey,
    responses: ResponseContext,
    submitted: bool,
}

impl SurveySession {
    pub fn new(survey: Survey, context: SurveyContext, prefills: Vec<ItemResponse>) -> Self {
        Self::from_parts(survey, ResponseContext::with_prefills(context, prefills))
    }

    pub fn from_parts(survey: Survey, responses: ResponseContext) -> Self {
        Self {
            survey,
            responses,
            submitted: false,
        }
    }

    pub fn survey(&self) -> &Survey {
        &self.survey
    }

    pub fn responses(&self) -> &ResponseContext {
        &self.responses
    }

    /// Used by the rendering side to record what the respondent entered.
    pub fn responses_mut(&mut self) -> &mut ResponseContext {
        &mut self.responses
    }

    pub fn pages(&self) -> Vec<Page<'_>> {
        survey_pages(&self.survey, &self.responses)
    }

    pub fn page_count(&self) -> usize {
        self.pages().len()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn resolve(&self, address: PageAddress) -> NavigationState {
        let count = self.page_count();
        let state = resolve_index(address, count);
        if state == NavigationState::Redirecting {
            debug!(
                survey = %self.survey.id,
                ?address,
                count,
                "page index out of range; redirecting to first page"
            );
        }
        state
    }

    pub fn validate_page(&self, index: usize) -> Result<ValidationResult, NavigationError> {
        let pages = self.pages();
        let page = pages.get(index).ok_or(NavigationError::OutOfRange {
            index,
            count: pages.len(),
        })?;
        Ok(validate_page(page, &self.responses))
    }

    /// Leaves page `index` forward: moves to the next page, or submits when
    /// `index` is the last page. Blocked while a hard rule on the page fails.
    pub fn advance(&mut self, index: usize) -> Result<Transition, NavigationError> {
        self.ensure_open()?;
        let count = self.page_count();
        if count == 0 {
            return self.submit().map(Transition::Submitted);
        }
        let validation = self.validate_page(index)?;
        if !validation.valid {
            debug!(
                survey = %self.survey.id,
                page = index,
                failed = validation.errors.len(),
                "advance blocked by hard validation"
            );
            return Ok(Transition::Blocked(validation));
        }
        if index + 1 == count {
            return self.submit().map(Transition::Submitted);
        }
        Ok(Transition::Moved {
            to: index + 1,
            reset_scroll: true,
        })
    }

    /// Goes back one page; never gated by validation.
    pub fn back(&self, index: usize) -> Result<Transition, NavigationError> {
        self.ensure_open()?;
        let count = self.page_count();
        if index >= count {
            return Err(NavigationError::OutOfRange { index, count });
        }
        Ok(Transition::Moved {
            to: index.saturating_sub(1),
            reset_scroll: true,
        })
    }

    /// Gathers every recorded response, visible or not. Succeeds once.
    pub fn submit(&mut self) -> Result<AnswerSet, NavigationError> {
        self.ensure_open()?;
        self.submitted = true;
        let answers = AnswerSet {
            survey_id: self.survey.id.clone(),
            version: self.survey.version.clone(),
            submitted_at: OffsetDateTime::now_utc().unix_timestamp(),
            responses: self.collect_responses(),
        };
        info!(survey = %answers.survey_id, responses = answers.responses.len(), "survey submitted");
        Ok(answers)
    }

    fn ensure_open(&self) -> Result<(), NavigationError> {
        if self.submitted {
            Err(NavigationError::AlreadySubmitted(self.survey.id.clone()))
        } else {
            Ok(())
        }
    }

    /// Tree order first, then responses for keys the tree does not know.
    fn collect_responses(&self) -> Vec<ItemResponse> {
        let mut remaining: BTreeMap<&str, &ItemResponse> = self
            .responses
            .responses()
            .map(|response| (response.key.as_str(), response))
            .collect();
        let mut out = Vec::with_capacity(remaining.len());
        for item in self.survey.single_items() {
            if let Some(response) = remaining.remove(item.key.as_str()) {
                out.push(response.clone());
            }
        }
        out.extend(remaining.into_values().cloned());
        out
    }
}
