//! Optional-filter query builder.
//!
//! A caller fills a [`FilterOptions`] with the criteria it cares about, using
//! logical [`OptionKey`]s. Each entity loader owns a [`FieldMapping`] from
//! logical key to physical document field, and [`QueryCompiler`] turns the two
//! into a [`Predicate`] plus [`FindOptions`]. Callers never see field names or
//! query operators.
//!
//! ```
//! use common::query::{FieldMapping, FilterOptions, OptionKey, QueryCompiler};
//!
//! let mapping = FieldMapping::new()
//!     .map(OptionKey::Name, "name")
//!     .map(OptionKey::Status, "status");
//! let options = FilterOptions::new().name("Ann").limit(10);
//!
//! let (predicate, find) = QueryCompiler::new(&mapping).compile(&options);
//! assert_eq!(predicate.len(), 1);
//! assert_eq!(find.limit, 10);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bson::{doc, Bson, Document};
use chrono::{DateTime, NaiveDate, Utc};
use domain::BIRTH_DATE_FORMAT;

// =============================================================================
// Option keys
// =============================================================================

/// Logical search criteria a caller may supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionKey {
    InstitutionId,
    Name,
    Phone,
    Guid,
    IdCard,
    Sex,
    BirthDate,
    Token,
    Disable,
    Status,
    CreateTime,
    LastModTime,
}

impl OptionKey {
    pub const ALL: [OptionKey; 12] = [
        OptionKey::InstitutionId,
        OptionKey::Name,
        OptionKey::Phone,
        OptionKey::Guid,
        OptionKey::IdCard,
        OptionKey::Sex,
        OptionKey::BirthDate,
        OptionKey::Token,
        OptionKey::Disable,
        OptionKey::Status,
        OptionKey::CreateTime,
        OptionKey::LastModTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKey::InstitutionId => "institution_id",
            OptionKey::Name => "name",
            OptionKey::Phone => "phone",
            OptionKey::Guid => "guid",
            OptionKey::IdCard => "id_card",
            OptionKey::Sex => "sex",
            OptionKey::BirthDate => "birth_date",
            OptionKey::Token => "token",
            OptionKey::Disable => "disable",
            OptionKey::Status => "status",
            OptionKey::CreateTime => "create_time",
            OptionKey::LastModTime => "last_mod_time",
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OptionKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown option key: {}", s))
    }
}

/// How a supplied value constrains its field.
///
/// `From` and `To` model the two ends of a range criterion; both are
/// inclusive and may be supplied independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bound {
    Exact,
    From,
    To,
}

impl Bound {
    /// Compile order for bounds of the same key
    pub const ALL: [Bound; 3] = [Bound::Exact, Bound::From, Bound::To];

    pub fn comparison(self) -> Comparison {
        match self {
            Bound::Exact => Comparison::Eq,
            Bound::From => Comparison::Gte,
            Bound::To => Comparison::Lte,
        }
    }
}

/// Comparison operator of a compiled clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gte,
    Lte,
}

impl Comparison {
    fn operator(self) -> Option<&'static str> {
        match self {
            Comparison::Eq => None,
            Comparison::Gte => Some("$gte"),
            Comparison::Lte => Some("$lte"),
        }
    }
}

// =============================================================================
// Filter option set
// =============================================================================

/// Requested sort: a logical key and a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub key: OptionKey,
    pub ascending: bool,
}

/// Sparse set of search criteria plus paging and sort.
///
/// Only criteria that were explicitly set take part in the compiled
/// predicate. Setting an empty string is a real criterion (`field == ""`),
/// distinct from leaving the key unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    values: BTreeMap<(OptionKey, Bound), Bson>,
    skip: Option<u64>,
    limit: Option<u64>,
    sort: Option<SortOrder>,
}

impl FilterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key == value`
    pub fn set(mut self, key: OptionKey, value: impl Into<Bson>) -> Self {
        self.insert(key, Bound::Exact, value);
        self
    }

    /// Require `key >= value`
    pub fn set_from(mut self, key: OptionKey, value: impl Into<Bson>) -> Self {
        self.insert(key, Bound::From, value);
        self
    }

    /// Require `key <= value`
    pub fn set_to(mut self, key: OptionKey, value: impl Into<Bson>) -> Self {
        self.insert(key, Bound::To, value);
        self
    }

    /// Record a criterion in place, replacing any previous value for the
    /// same key and bound.
    pub fn insert(&mut self, key: OptionKey, bound: Bound, value: impl Into<Bson>) {
        self.values.insert((key, bound), value.into());
    }

    pub fn remove(&mut self, key: OptionKey, bound: Bound) -> Option<Bson> {
        self.values.remove(&(key, bound))
    }

    pub fn get(&self, key: OptionKey, bound: Bound) -> Option<&Bson> {
        self.values.get(&(key, bound))
    }

    /// Check whether any bound of `key` was set
    pub fn is_set(&self, key: OptionKey) -> bool {
        Bound::ALL.iter().any(|bound| self.values.contains_key(&(key, *bound)))
    }

    /// Number of criteria set (paging and sort excluded)
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Cap the page size; 0 means unbounded
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort_by(mut self, key: OptionKey, ascending: bool) -> Self {
        self.sort = Some(SortOrder { key, ascending });
        self
    }

    pub fn requested_skip(&self) -> u64 {
        self.skip.unwrap_or(0)
    }

    /// Requested limit, 0 when unset or unbounded
    pub fn requested_limit(&self) -> u64 {
        self.limit.unwrap_or(0)
    }

    pub fn sort_order(&self) -> Option<SortOrder> {
        self.sort
    }

    // -------------------------------------------------------------------------
    // Typed setters
    // -------------------------------------------------------------------------

    pub fn institution_id(self, id: impl Into<String>) -> Self {
        self.set(OptionKey::InstitutionId, id.into())
    }

    pub fn name(self, name: impl Into<String>) -> Self {
        self.set(OptionKey::Name, name.into())
    }

    pub fn phone(self, phone: impl Into<String>) -> Self {
        self.set(OptionKey::Phone, phone.into())
    }

    pub fn guid(self, guid: impl Into<String>) -> Self {
        self.set(OptionKey::Guid, guid.into())
    }

    pub fn id_card(self, id_card: impl Into<String>) -> Self {
        self.set(OptionKey::IdCard, id_card.into())
    }

    pub fn sex(self, sex: i32) -> Self {
        self.set(OptionKey::Sex, sex)
    }

    pub fn token(self, token: impl Into<String>) -> Self {
        self.set(OptionKey::Token, token.into())
    }

    pub fn disable(self, disable: bool) -> Self {
        self.set(OptionKey::Disable, disable)
    }

    pub fn status(self, status: i32) -> Self {
        self.set(OptionKey::Status, status)
    }

    pub fn birth_date(self, date: NaiveDate) -> Self {
        self.set(OptionKey::BirthDate, date_value(date))
    }

    pub fn birth_date_from(self, date: NaiveDate) -> Self {
        self.set_from(OptionKey::BirthDate, date_value(date))
    }

    pub fn birth_date_to(self, date: NaiveDate) -> Self {
        self.set_to(OptionKey::BirthDate, date_value(date))
    }

    pub fn create_time_from(self, time: DateTime<Utc>) -> Self {
        self.set_from(OptionKey::CreateTime, time_value(time))
    }

    pub fn create_time_to(self, time: DateTime<Utc>) -> Self {
        self.set_to(OptionKey::CreateTime, time_value(time))
    }

    pub fn last_mod_time_from(self, time: DateTime<Utc>) -> Self {
        self.set_from(OptionKey::LastModTime, time_value(time))
    }

    pub fn last_mod_time_to(self, time: DateTime<Utc>) -> Self {
        self.set_to(OptionKey::LastModTime, time_value(time))
    }
}

/// Stored representation of a calendar date
pub fn date_value(date: NaiveDate) -> Bson {
    Bson::String(date.format(BIRTH_DATE_FORMAT).to_string())
}

/// Stored representation of an instant (millisecond precision)
pub fn time_value(time: DateTime<Utc>) -> Bson {
    Bson::DateTime(bson::DateTime::from_chrono(time))
}

// =============================================================================
// Key -> field mapping
// =============================================================================

/// Ordered, injective translation from logical key to physical field.
///
/// Compiled clauses follow the order in which keys were mapped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    entries: Vec<(OptionKey, String)>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `key` to `field`. Remapping a key keeps its original position.
    ///
    /// Panics in debug builds if `field` is already mapped from another key.
    pub fn map(mut self, key: OptionKey, field: impl Into<String>) -> Self {
        let field = field.into();
        debug_assert!(
            !self.entries.iter().any(|(k, f)| *k != key && *f == field),
            "field `{}` mapped from two keys",
            field
        );

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = field,
            None => self.entries.push((key, field)),
        }
        self
    }

    pub fn field(&self, key: OptionKey) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, f)| f.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (OptionKey, &str)> {
        self.entries.iter().map(|(k, f)| (*k, f.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Compiled query
// =============================================================================

/// A single `field <op> value` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub field: String,
    pub comparison: Comparison,
    pub value: Bson,
}

impl Clause {
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self {
            field: field.into(),
            comparison: Comparison::Eq,
            value: value.into(),
        }
    }

    pub fn to_document(&self) -> Document {
        let condition = match self.comparison.operator() {
            None => self.value.clone(),
            Some(op) => {
                let mut inner = Document::new();
                inner.insert(op, self.value.clone());
                Bson::Document(inner)
            }
        };
        let mut document = Document::new();
        document.insert(self.field.clone(), condition);
        document
    }
}

/// Conjunction of clauses. No clauses matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    /// Predicate matching every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Single equality predicate, used for point lookups
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self {
            clauses: vec![Clause::eq(field, value)],
        }
    }

    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Render as a query document.
    ///
    /// Several clauses are wrapped in `$and` so that a `from`/`to` pair on the
    /// same field does not collapse into one key.
    pub fn to_document(&self) -> Document {
        match self.clauses.as_slice() {
            [] => Document::new(),
            [clause] => clause.to_document(),
            clauses => {
                let parts: Vec<Bson> = clauses
                    .iter()
                    .map(|c| Bson::Document(c.to_document()))
                    .collect();
                doc! { "$and": parts }
            }
        }
    }
}

/// Fields to leave out of returned documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    excluded: Vec<String>,
}

impl Projection {
    /// Return every field
    pub fn all() -> Self {
        Self::default()
    }

    pub fn excluding<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_all(&self) -> bool {
        self.excluded.is_empty()
    }

    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    /// Render as `{field: 0, ...}`, or `None` for all fields
    pub fn to_document(&self) -> Option<Document> {
        if self.is_all() {
            return None;
        }
        Some(
            self.excluded
                .iter()
                .map(|f| (f.clone(), Bson::Int32(0)))
                .collect(),
        )
    }
}

/// Sort resolved to a physical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSort {
    pub field: String,
    pub ascending: bool,
}

impl FieldSort {
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        document.insert(self.field.clone(), if self.ascending { 1 } else { -1 });
        document
    }
}

/// Result shaping for a find call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub projection: Projection,
    pub skip: u64,
    /// 0 means unbounded
    pub limit: u64,
    /// `None` keeps the store's natural order
    pub sort: Option<FieldSort>,
}

impl FindOptions {
    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }
}

// =============================================================================
// Compiler
// =============================================================================

/// Compiles a [`FilterOptions`] against a [`FieldMapping`].
///
/// Compilation is a pure transformation and cannot fail. Keys set on the
/// options but missing from the mapping are ignored, so a caller may pass
/// criteria an entity does not support.
#[derive(Debug, Clone, Copy)]
pub struct QueryCompiler<'a> {
    mapping: &'a FieldMapping,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(mapping: &'a FieldMapping) -> Self {
        Self { mapping }
    }

    pub fn predicate(&self, options: &FilterOptions) -> Predicate {
        let mut predicate = Predicate::all();
        for (key, field) in self.mapping.iter() {
            for bound in Bound::ALL {
                if let Some(value) = options.get(key, bound) {
                    predicate = predicate.and(Clause {
                        field: field.to_string(),
                        comparison: bound.comparison(),
                        value: value.clone(),
                    });
                }
            }
        }
        predicate
    }

    /// Paging and sort; projection defaults to all fields
    pub fn find_options(&self, options: &FilterOptions) -> FindOptions {
        let sort = options.sort_order().and_then(|order| {
            self.mapping.field(order.key).map(|field| FieldSort {
                field: field.to_string(),
                ascending: order.ascending,
            })
        });

        FindOptions {
            projection: Projection::all(),
            skip: options.requested_skip(),
            limit: options.requested_limit(),
            sort,
        }
    }

    pub fn compile(&self, options: &FilterOptions) -> (Predicate, FindOptions) {
        (self.predicate(options), self.find_options(options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn mapping() -> FieldMapping {
        FieldMapping::new()
            .map(OptionKey::InstitutionId, "ref_institution_list")
            .map(OptionKey::Name, "name")
            .map(OptionKey::Phone, "phone")
            .map(OptionKey::Guid, "_id")
            .map(OptionKey::Disable, "disable")
            .map(OptionKey::Status, "status")
            .map(OptionKey::BirthDate, "birth_date")
            .map(OptionKey::CreateTime, "create_time")
    }

    #[test]
    fn test_empty_options_compile_to_universal_predicate() {
        let mapping = mapping();
        let predicate = QueryCompiler::new(&mapping).predicate(&FilterOptions::new());

        assert!(predicate.is_empty());
        assert_eq!(predicate.to_document(), Document::new());
    }

    #[test]
    fn test_single_key_compiles_to_single_equality() {
        let mapping = mapping();
        let options = FilterOptions::new().phone("555-0100");
        let predicate = QueryCompiler::new(&mapping).predicate(&options);

        assert_eq!(predicate.clauses(), &[Clause::eq("phone", "555-0100")]);
        assert_eq!(predicate.to_document(), doc! { "phone": "555-0100" });
    }

    #[test]
    fn test_each_mapped_key_alone_yields_exactly_its_clause() {
        let mapping = mapping();
        let compiler = QueryCompiler::new(&mapping);

        for (key, field) in mapping.iter() {
            let options = FilterOptions::new().set(key, "v");
            let predicate = compiler.predicate(&options);
            assert_eq!(predicate.clauses(), &[Clause::eq(field, "v")], "key {}", key);
        }
    }

    #[test]
    fn test_explicit_empty_value_is_a_criterion() {
        let mapping = mapping();
        let options = FilterOptions::new().name("");
        let predicate = QueryCompiler::new(&mapping).predicate(&options);

        assert_eq!(predicate.clauses(), &[Clause::eq("name", "")]);
    }

    #[test]
    fn test_unmapped_keys_are_ignored() {
        let mapping = mapping();
        let options = FilterOptions::new()
            .token("secret")
            .id_card("X123")
            .sex(1)
            .status(2);
        let predicate = QueryCompiler::new(&mapping).predicate(&options);

        assert_eq!(predicate.clauses(), &[Clause::eq("status", 2)]);
        assert!(predicate.clauses().iter().all(|c| c.field != "token"));
    }

    #[test]
    fn test_clause_order_follows_mapping() {
        let mapping = mapping();
        let options = FilterOptions::new()
            .status(1)
            .disable(false)
            .name("Ann")
            .institution_id("inst-1");
        let predicate = QueryCompiler::new(&mapping).predicate(&options);

        let fields: Vec<&str> = predicate.clauses().iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["ref_institution_list", "name", "disable", "status"]);
        assert_eq!(
            predicate.to_document(),
            doc! { "$and": [
                { "ref_institution_list": "inst-1" },
                { "name": "Ann" },
                { "disable": false },
                { "status": 1 }
            ] }
        );
    }

    #[test]
    fn test_range_keys_compile_to_inclusive_comparisons_on_one_field() {
        let mapping = mapping();
        let from = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        let options = FilterOptions::new().birth_date_from(from).birth_date_to(to);
        let predicate = QueryCompiler::new(&mapping).predicate(&options);

        assert_eq!(
            predicate.clauses(),
            &[
                Clause {
                    field: "birth_date".into(),
                    comparison: Comparison::Gte,
                    value: Bson::String("1990-01-01".into()),
                },
                Clause {
                    field: "birth_date".into(),
                    comparison: Comparison::Lte,
                    value: Bson::String("1999-12-31".into()),
                },
            ]
        );
        assert!(predicate.clauses().iter().all(|c| c.comparison != Comparison::Eq));
        assert_eq!(
            predicate.to_document(),
            doc! { "$and": [
                { "birth_date": { "$gte": "1990-01-01" } },
                { "birth_date": { "$lte": "1999-12-31" } }
            ] }
        );
    }

    #[test]
    fn test_open_ended_time_range() {
        let mapping = mapping();
        let since = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let options = FilterOptions::new().create_time_from(since);
        let predicate = QueryCompiler::new(&mapping).predicate(&options);

        assert_eq!(
            predicate.to_document(),
            doc! { "create_time": { "$gte": bson::DateTime::from_chrono(since) } }
        );
    }

    #[test]
    fn test_find_options_defaults() {
        let mapping = mapping();
        let find = QueryCompiler::new(&mapping).find_options(&FilterOptions::new());

        assert!(find.projection.is_all());
        assert_eq!(find.projection.to_document(), None);
        assert_eq!(find.skip, 0);
        assert_eq!(find.limit, 0);
        assert_eq!(find.sort, None);
    }

    #[test]
    fn test_find_options_paging_and_sort() {
        let mapping = mapping();
        let options = FilterOptions::new()
            .skip(10)
            .limit(5)
            .sort_by(OptionKey::CreateTime, false);
        let find = QueryCompiler::new(&mapping)
            .find_options(&options)
            .with_projection(Projection::excluding(["token", "password"]));

        assert_eq!(find.skip, 10);
        assert_eq!(find.limit, 5);
        assert_eq!(
            find.sort.as_ref().map(FieldSort::to_document),
            Some(doc! { "create_time": -1 })
        );
        assert_eq!(
            find.projection.to_document(),
            Some(doc! { "token": 0, "password": 0 })
        );
    }

    #[test]
    fn test_unmapped_sort_key_keeps_natural_order() {
        let mapping = mapping();
        let options = FilterOptions::new().sort_by(OptionKey::Token, true);
        let find = QueryCompiler::new(&mapping).find_options(&options);

        assert_eq!(find.sort, None);
    }

    #[test]
    fn test_remapping_keeps_position() {
        let mapping = FieldMapping::new()
            .map(OptionKey::Name, "name")
            .map(OptionKey::Phone, "phone")
            .map(OptionKey::Name, "display_name");

        let keys: Vec<(OptionKey, &str)> = mapping.iter().collect();
        assert_eq!(
            keys,
            vec![(OptionKey::Name, "display_name"), (OptionKey::Phone, "phone")]
        );
    }

    #[test]
    fn test_option_key_parses_from_its_name() {
        for key in OptionKey::ALL {
            assert_eq!(key.as_str().parse::<OptionKey>(), Ok(key));
        }
        assert!("nope".parse::<OptionKey>().is_err());
    }

    #[test]
    fn test_presence_tracking() {
        let mut options = FilterOptions::new().create_time_to(Utc::now());
        assert!(options.is_set(OptionKey::CreateTime));
        assert!(options.get(OptionKey::CreateTime, Bound::Exact).is_none());
        assert!(!options.is_set(OptionKey::Name));

        options.remove(OptionKey::CreateTime, Bound::To);
        assert!(options.is_empty());
    }
}
