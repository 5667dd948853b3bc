use crate::models::FilterCriteria;
use chrono::NaiveDate;
use std::{cell::RefCell, rc::Rc};
use tracing::{debug, warn};

/// Receives every published [`FilterCriteria`], synchronously, in publish order.
pub trait CriteriaSubscriber {
    fn criteria_published(&mut self, criteria: &FilterCriteria);
}

pub type SharedSubscriber = Rc<RefCell<dyn CriteriaSubscriber>>;

/// Single owner of the current filter criteria.
///
/// Each mutator returns whether anything was published. Changing `category`
/// clears `subcategory` in the same publish, and changing `state` clears
/// `city`, so no subscriber ever sees a child value paired with the wrong
/// parent.
#[derive(Default)]
pub struct FilterState {
    criteria: FilterCriteria,
    subscribers: Vec<SharedSubscriber>,
    publish_count: u64,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn publish_count(&self) -> u64 {
        self.publish_count
    }

    pub fn subscribe(&mut self, subscriber: SharedSubscriber) {
        self.subscribers.push(subscriber);
    }

    /// Re-publishes the current criteria unchanged.
    pub fn publish_current(&mut self) {
        self.publish_count += 1;
        debug!(publish = self.publish_count, criteria = ?self.criteria, "publishing filter criteria");
        if self.criteria.has_inverted_range() {
            debug!("start_date is after end_date; passing the range through as given");
        }
        for subscriber in &self.subscribers {
            subscriber.borrow_mut().criteria_published(&self.criteria);
        }
    }

    pub fn set_start_date(&mut self, date: Option<NaiveDate>) -> bool {
        let mut next = self.criteria.clone();
        next.start_date = date;
        self.replace(next)
    }

    pub fn set_end_date(&mut self, date: Option<NaiveDate>) -> bool {
        let mut next = self.criteria.clone();
        next.end_date = date;
        self.replace(next)
    }

    pub fn set_category(&mut self, category: Option<&str>) -> bool {
        let category = normalize(category);
        if category == self.criteria.category {
            return false;
        }
        let mut next = self.criteria.clone();
        next.category = category;
        next.subcategory = None;
        self.replace(next)
    }

    pub fn set_subcategory(&mut self, subcategory: Option<&str>) -> bool {
        let subcategory = normalize(subcategory);
        if subcategory.is_some() && self.criteria.category.is_none() {
            warn!(?subcategory, "ignoring subcategory while no category is selected");
            return false;
        }
        let mut next = self.criteria.clone();
        next.subcategory = subcategory;
        self.replace(next)
    }

    pub fn set_state(&mut self, state: Option<&str>) -> bool {
        let state = normalize(state);
        if state == self.criteria.state {
            return false;
        }
        let mut next = self.criteria.clone();
        next.state = state;
        next.city = None;
        self.replace(next)
    }

    pub fn set_city(&mut self, city: Option<&str>) -> bool {
        let city = normalize(city);
        if city.is_some() && self.criteria.state.is_none() {
            warn!(?city, "ignoring city while no state is selected");
            return false;
        }
        let mut next = self.criteria.clone();
        next.city = city;
        self.replace(next)
    }

    /// Unsets every field with a single publish.
    pub fn clear(&mut self) -> bool {
        self.replace(FilterCriteria::default())
    }

    fn replace(&mut self, next: FilterCriteria) -> bool {
        if next == self.criteria {
            return false;
        }
        self.criteria = next;
        self.publish_current();
        true
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
