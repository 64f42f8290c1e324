//! Filtering, sorting and offset pagination shared by every list endpoint.
//!
//! A [`ListQuery`] is a plain value: an ordered list of predicates, a sort
//! column taken from a per-collection allow-list, and a clamped page window.
//! It is rendered by SeaQuery for whatever backend the connection speaks, so
//! user input only ever reaches the database as bound values.

use async_trait::async_trait;
use sea_orm::sea_query::{ColumnRef, Expr, Func, IntoColumnRef, IntoIden, LikeExpr, SimpleExpr};
use sea_orm::{
    Condition, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, SelectTwo, Value,
};
use serde::Serialize;
use std::fmt;

use crate::config::PaginationConfig;
use crate::domain::SortOrder;

/// Escape character for `LIKE` patterns built from user input.
pub const LIKE_ESCAPE: char = '!';

/// SQLite binds `OFFSET` as a signed 64-bit integer.
const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// Qualified `table.column` reference, unambiguous in joined selects.
pub fn column<E, C>(entity: E, col: C) -> ColumnRef
where
    E: IntoIden + 'static,
    C: IntoIden + 'static,
{
    (entity, col).into_column_ref()
}

/// Builds a case-insensitive substring pattern in which `%`, `_` and the
/// escape character itself match literally.
///
/// Only ASCII is folded, matching SQLite's `LOWER()` on the column side.
#[must_use]
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.to_ascii_lowercase().chars() {
        if matches!(ch, '%' | '_') || ch == LIKE_ESCAPE {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// A single `WHERE` term. Terms are joined with `AND`.
#[derive(Debug, Clone)]
pub enum Predicate {
    Equals { column: ColumnRef, value: Value },
    /// Matches when any of the columns contains the needle.
    Contains {
        columns: Vec<ColumnRef>,
        needle: String,
    },
}

impl Predicate {
    fn to_condition(&self) -> Condition {
        match self {
            Self::Equals { column, value } => {
                Condition::all().add(Expr::col(column.clone()).eq(value.clone()))
            }
            Self::Contains { columns, needle } => {
                let pattern = contains_pattern(needle);
                columns.iter().fold(Condition::any(), |cond, column| {
                    cond.add(
                        Expr::expr(Func::lower(Expr::col(column.clone())))
                            .like(LikeExpr::new(pattern.clone()).escape(LIKE_ESCAPE)),
                    )
                })
            }
        }
    }
}

/// Allow-list of sortable columns for one collection.
pub trait SortField: Copy + fmt::Debug + Send + Sync + 'static {
    const DEFAULT: Self;
    const DEFAULT_ORDER: SortOrder;

    /// Maps a `sortBy` parameter onto the allow-list.
    fn from_param(raw: &str) -> Option<Self>;

    fn expr(self) -> SimpleExpr;

    /// Primary key of the listed rows, appended last so pages are stable.
    fn tie_breaker() -> SimpleExpr;

    /// Ordering applied ahead of the requested sort (pinned threads first).
    fn leading_order() -> Option<(SimpleExpr, Order)> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec<F> {
    pub field: F,
    pub order: SortOrder,
}

impl<F: SortField> SortSpec<F> {
    /// Unknown columns or directions fall back to the collection default.
    #[must_use]
    pub fn parse(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        Self {
            field: sort_by.and_then(F::from_param).unwrap_or(F::DEFAULT),
            order: sort_order
                .and_then(SortOrder::parse)
                .unwrap_or(F::DEFAULT_ORDER),
        }
    }
}

impl<F: SortField> Default for SortSpec<F> {
    fn default() -> Self {
        Self {
            field: F::DEFAULT,
            order: F::DEFAULT_ORDER,
        }
    }
}

/// Offset window. Always has `page >= 1` and `1 <= limit <= max_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    page: u64,
    limit: u64,
}

impl PageSpec {
    /// Clamps raw values into range: `page < 1` becomes 1, a `limit` below 1
    /// becomes the default and a `limit` above the maximum becomes the maximum.
    #[must_use]
    pub fn clamp(page: Option<i64>, limit: Option<i64>, config: &PaginationConfig) -> Self {
        let page = page
            .and_then(|p| u64::try_from(p).ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);

        let limit = match limit.and_then(|l| u64::try_from(l).ok()) {
            Some(l) if l >= 1 => l.min(config.max_limit),
            _ => config.default_limit,
        };

        Self { page, limit }
    }

    /// Like [`PageSpec::clamp`], treating non-numeric input as absent.
    #[must_use]
    pub fn from_params(page: Option<&str>, limit: Option<&str>, config: &PaginationConfig) -> Self {
        let parse = |raw: Option<&str>| raw.and_then(|s| s.trim().parse::<i64>().ok());
        Self::clamp(parse(page), parse(limit), config)
    }

    #[must_use]
    pub const fn page(&self) -> u64 {
        self.page
    }

    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Rows to skip. Pages far past the end saturate instead of overflowing
    /// the bound parameter.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        let offset = (self.page - 1).saturating_mul(self.limit);
        if offset > MAX_OFFSET { MAX_OFFSET } else { offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    #[must_use]
    pub const fn new(spec: PageSpec, total: u64) -> Self {
        let (page, limit) = (spec.page(), spec.limit());
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit),
            has_next: page.saturating_mul(limit) < total,
            has_prev: page > 1,
        }
    }
}

/// One page of rows plus the metadata describing where it sits.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Selects that can be counted and fetched by [`ListQuery::fetch`].
#[async_trait]
pub trait Listable: QueryFilter + QueryOrder + QuerySelect + Clone + Send + Sized {
    type Item: Send;

    async fn count_rows(self, conn: &DatabaseConnection) -> Result<u64, DbErr>;

    async fn fetch_rows(self, conn: &DatabaseConnection) -> Result<Vec<Self::Item>, DbErr>;
}

#[async_trait]
impl<E> Listable for Select<E>
where
    E: EntityTrait,
    E::Model: Sync,
{
    type Item = E::Model;

    async fn count_rows(self, conn: &DatabaseConnection) -> Result<u64, DbErr> {
        PaginatorTrait::count(self, conn).await
    }

    async fn fetch_rows(self, conn: &DatabaseConnection) -> Result<Vec<Self::Item>, DbErr> {
        self.all(conn).await
    }
}

#[async_trait]
impl<E, F> Listable for SelectTwo<E, F>
where
    E: EntityTrait,
    F: EntityTrait,
    E::Model: Sync,
    F::Model: Sync,
{
    type Item = (E::Model, Option<F::Model>);

    async fn count_rows(self, conn: &DatabaseConnection) -> Result<u64, DbErr> {
        PaginatorTrait::count(self, conn).await
    }

    async fn fetch_rows(self, conn: &DatabaseConnection) -> Result<Vec<Self::Item>, DbErr> {
        self.all(conn).await
    }
}

#[derive(Debug, Clone)]
pub struct ListQuery<F> {
    predicates: Vec<Predicate>,
    sort: SortSpec<F>,
    page: PageSpec,
}

impl<F: SortField> ListQuery<F> {
    #[must_use]
    pub const fn new(sort: SortSpec<F>, page: PageSpec) -> Self {
        Self {
            predicates: Vec::new(),
            sort,
            page,
        }
    }

    #[must_use]
    pub fn equals(mut self, column: ColumnRef, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Equals {
            column,
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn equals_opt<V: Into<Value>>(self, column: ColumnRef, value: Option<V>) -> Self {
        match value {
            Some(value) => self.equals(column, value),
            None => self,
        }
    }

    /// Blank needles are ignored.
    #[must_use]
    pub fn contains(self, column: ColumnRef, needle: Option<&str>) -> Self {
        self.contains_any(vec![column], needle)
    }

    #[must_use]
    pub fn contains_any(mut self, columns: Vec<ColumnRef>, needle: Option<&str>) -> Self {
        if let Some(needle) = needle.map(str::trim)
            && !needle.is_empty()
        {
            self.predicates.push(Predicate::Contains {
                columns,
                needle: needle.to_string(),
            });
        }
        self
    }

    #[must_use]
    pub fn condition(&self) -> Condition {
        self.predicates
            .iter()
            .fold(Condition::all(), |cond, p| cond.add(p.to_condition()))
    }

    pub fn filtered<Q: QueryFilter>(&self, query: Q) -> Q {
        query.filter(self.condition())
    }

    pub fn ordered<Q: QueryOrder>(&self, query: Q) -> Q {
        let mut query = query;
        if let Some((expr, order)) = F::leading_order() {
            query = query.order_by(expr, order);
        }
        query
            .order_by(self.sort.field.expr(), self.sort.order.into())
            .order_by(F::tie_breaker(), Order::Asc)
    }

    pub fn paged<Q: QuerySelect>(&self, query: Q) -> Q {
        query.limit(self.page.limit()).offset(self.page.offset())
    }

    /// The full data query: predicates, ordering and the page window.
    pub fn apply<Q>(&self, query: Q) -> Q
    where
        Q: QueryFilter + QueryOrder + QuerySelect,
    {
        self.paged(self.ordered(self.filtered(query)))
    }

    /// Runs the count query (same predicates, no ordering or window) and the
    /// data query against `conn`.
    pub async fn fetch<S: Listable>(
        &self,
        select: S,
        conn: &DatabaseConnection,
    ) -> Result<Page<S::Item>, DbErr> {
        let total = self.filtered(select.clone()).count_rows(conn).await?;
        let items = self.apply(select).fetch_rows(conn).await?;

        Ok(Page {
            items,
            pagination: Pagination::new(self.page, total),
        })
    }
}
