//! The query pipeline.
//!
//! Stages run strictly in this order: filter, inline count, order,
//! skip-token, skip, limit, materialize, truncate.

use super::eval::{compare, Evaluator};
use super::expr::{Direction, Expr, OrderBy};
use super::info::{InlineCount, QueryInfo};
use super::path::SelectExpandState;
use crate::accessor::Record;
use crate::config::ProducerConfig;
use crate::entity::{EntityKey, WireEntity, WireProperty};
use crate::error::{CoreError, CoreResult};
use crate::materialize::{related_records, EntityMaterializer};
use crate::metadata::{EntitySet, MetadataModel};
use crate::registry::{EntitySetRegistration, Registry};
use entiodata_codec::Value;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultPage {
    /// Entity set queried.
    pub entity_set: String,
    /// Entities on this page, in result order.
    pub entities: Vec<WireEntity>,
    /// Entities passing the filter across all pages, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_count: Option<usize>,
    /// Token for the next page; present iff results were truncated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_token: Option<String>,
}

/// Result of following a navigation or property from one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NavigationResponse {
    /// Entities at the far end of a collection navigation.
    Entities(Vec<WireEntity>),
    /// The entity at the far end of a single navigation, if any.
    Entity(Option<WireEntity>),
    /// A simple property of the entity.
    Property(WireProperty),
}

/// Runs queries against registered record sources.
pub struct QueryEngine<'a> {
    registry: &'a Registry,
    model: &'a MetadataModel,
    config: &'a ProducerConfig,
}

impl<'a> QueryEngine<'a> {
    /// Creates an engine over a registry and its generated model.
    pub fn new(registry: &'a Registry, model: &'a MetadataModel, config: &'a ProducerConfig) -> Self {
        Self {
            registry,
            model,
            config,
        }
    }

    fn materializer(&self) -> EntityMaterializer<'a> {
        EntityMaterializer::new(self.registry, self.model, self.config)
    }

    fn lookup(&self, set_name: &str) -> CoreResult<(&'a EntitySet, &'a EntitySetRegistration)> {
        let set = self.model.entity_set(set_name)?;
        let registration = self
            .registry
            .entity_set(set_name)
            .ok_or_else(|| CoreError::not_found(format!("entity set {set_name}")))?;
        Ok((set, registration))
    }

    /// Returns one page of entities.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown set,
    /// [`CoreError::Evaluation`] for ill-typed filter or ordering
    /// expressions, and materialization errors.
    pub fn get_entities(&self, set_name: &str, query: &QueryInfo) -> CoreResult<ResultPage> {
        let (set, registration) = self.lookup(set_name)?;
        let records = registration.records();
        debug!("Query {set_name}: {} source records", records.len());

        let records = self.filter(records, query.filter.as_ref())?;
        let inline_count = (query.inline_count == InlineCount::AllPages).then_some(records.len());

        let records = self.order(records, &query.order_by)?;
        let records = match &query.skip_token {
            Some(token) => self.skip_past(set, registration, records, token)?,
            None => records,
        };

        let limit = query
            .top
            .map_or(self.config.max_results, |top| top.min(self.config.max_results));
        let materializer = self.materializer();
        let mut entities = Vec::new();
        for record in records
            .iter()
            .skip(query.skip.unwrap_or(0))
            .take(limit.saturating_add(1))
        {
            let mut state = SelectExpandState::new(&query.select, &query.expand);
            entities.push(materializer.to_wire_entity(set, record, &mut state)?);
        }

        let skip_token = if entities.len() > limit {
            entities.truncate(limit);
            entities.last().map(WireEntity::key_string).transpose()?
        } else {
            None
        };
        debug!(
            "Query {set_name}: returning {} entities, more: {}",
            entities.len(),
            skip_token.is_some()
        );

        Ok(ResultPage {
            entity_set: set.name.clone(),
            entities,
            inline_count,
            skip_token,
        })
    }

    /// Counts entities matching the filter, after skip and top.
    ///
    /// Ordering is irrelevant to a count and the page size limit does not
    /// apply.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedOperation`] when the query asks for an
    /// inline count or carries a skip token.
    pub fn get_entities_count(&self, set_name: &str, query: &QueryInfo) -> CoreResult<usize> {
        if query.inline_count == InlineCount::AllPages {
            return Err(CoreError::unsupported("inline count on a count request"));
        }
        if query.skip_token.is_some() {
            return Err(CoreError::unsupported("skip token on a count request"));
        }

        let (_, registration) = self.lookup(set_name)?;
        let records = self.filter(registration.records(), query.filter.as_ref())?;
        let remaining = records.len().saturating_sub(query.skip.unwrap_or(0));
        Ok(query.top.map_or(remaining, |top| remaining.min(top)))
    }

    /// Looks up one entity by key.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] when no entity has the key, including
    /// when the key names too few fields.
    pub fn get_entity(
        &self,
        set_name: &str,
        key: &EntityKey,
        query: &QueryInfo,
    ) -> CoreResult<WireEntity> {
        let (set, registration) = self.lookup(set_name)?;
        let record = self.find(set, registration, key)?;
        let mut state = SelectExpandState::new(&query.select, &query.expand);
        self.materializer().to_wire_entity(set, &record, &mut state)
    }

    /// Follows a navigation property, or reads a simple property, of one
    /// entity.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for unknown entities or names and
    /// [`CoreError::UnsupportedOperation`] for complex or collection
    /// properties.
    pub fn get_nav_property(
        &self,
        set_name: &str,
        key: &EntityKey,
        name: &str,
        query: &QueryInfo,
    ) -> CoreResult<NavigationResponse> {
        let (set, registration) = self.lookup(set_name)?;
        let record = self.find(set, registration, key)?;
        let accessor = registration.accessor().as_ref();
        let materializer = self.materializer();

        if let Some(nav) = set.entity_type.navigation_property(name) {
            let target = self.model.entity_set_for_type(&nav.target_type).ok_or_else(|| {
                CoreError::not_found(format!("entity set for type {}", nav.target_type))
            })?;
            let mut entities = Vec::new();
            for related in related_records(accessor, record.data(), nav)? {
                let mut state = SelectExpandState::new(&query.select, &query.expand);
                entities.push(materializer.to_wire_entity(target, &related, &mut state)?);
            }
            return Ok(if nav.multiplicity.is_many() {
                NavigationResponse::Entities(entities)
            } else {
                NavigationResponse::Entity(entities.into_iter().next())
            });
        }

        let property = set.entity_type.property(name).ok_or_else(|| {
            CoreError::not_found(format!("property {name} of {}", set.entity_type.name()))
        })?;
        if !property.ty.is_simple() {
            return Err(CoreError::unsupported(format!(
                "navigating to {} property {name}",
                property.ty
            )));
        }
        let wire = materializer
            .project(record.data(), accessor, property)?
            .unwrap_or_else(|| WireProperty::simple(name, property.ty.clone(), Value::Null));
        Ok(NavigationResponse::Property(wire))
    }

    fn find(
        &self,
        set: &EntitySet,
        registration: &EntitySetRegistration,
        key: &EntityKey,
    ) -> CoreResult<Record> {
        let materializer = self.materializer();
        let accessor = registration.accessor().as_ref();
        for record in registration.records() {
            if materializer
                .extract_key(set, accessor, record.data())?
                .matches(key)
            {
                return Ok(record);
            }
        }
        Err(CoreError::not_found(format!("{}{key}", set.name)))
    }

    fn filter(&self, records: Vec<Record>, filter: Option<&Expr>) -> CoreResult<Vec<Record>> {
        let Some(filter) = filter else {
            return Ok(records);
        };
        let evaluator = Evaluator::new(self.registry);
        let mut kept = Vec::with_capacity(records.len());
        for record in records {
            if evaluator.evaluate_predicate(filter, &record)? {
                kept.push(record);
            }
        }
        debug!("Filter kept {} records", kept.len());
        Ok(kept)
    }

    /// Stable sort by every key, the first key dominant.
    fn order(&self, records: Vec<Record>, order_by: &[OrderBy]) -> CoreResult<Vec<Record>> {
        if order_by.is_empty() {
            return Ok(records);
        }
        let evaluator = Evaluator::new(self.registry);
        let mut keyed = Vec::with_capacity(records.len());
        for record in records {
            let keys = order_by
                .iter()
                .map(|o| evaluator.evaluate(&o.expr, &record))
                .collect::<CoreResult<Vec<_>>>()?;
            keyed.push((keys, record));
        }

        let mut failure = None;
        keyed.sort_by(|(a, _), (b, _)| {
            for (i, order) in order_by.iter().enumerate() {
                let ord = match order_key_cmp(&a[i], &b[i]) {
                    Ok(ord) => ord,
                    Err(e) => {
                        failure.get_or_insert(e);
                        Ordering::Equal
                    }
                };
                let ord = match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
        if let Some(e) = failure {
            return Err(e);
        }
        Ok(keyed.into_iter().map(|(_, record)| record).collect())
    }

    /// Drops records up to and including the one whose key string is
    /// `token`. Everything is dropped if no record matches.
    fn skip_past(
        &self,
        set: &EntitySet,
        registration: &EntitySetRegistration,
        records: Vec<Record>,
        token: &str,
    ) -> CoreResult<Vec<Record>> {
        let materializer = self.materializer();
        let accessor = registration.accessor().as_ref();
        let mut iter = records.into_iter();
        for record in iter.by_ref() {
            let key = materializer.extract_key(set, accessor, record.data())?;
            if key.to_key_string()? == token {
                return Ok(iter.collect());
            }
        }
        debug!("Skip token {token} matched no {} entity", set.name);
        Ok(Vec::new())
    }
}

fn order_key_cmp(a: &Value, b: &Value) -> CoreResult<Ordering> {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ok(Ordering::Equal),
        (true, false) => Ok(Ordering::Less),
        (false, true) => Ok(Ordering::Greater),
        (false, false) => compare(a, b),
    }
}
