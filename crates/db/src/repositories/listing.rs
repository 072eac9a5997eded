//! List pages for every table behind the query envelope.

use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, IdenStatic, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select,
};

use foundry_shared::types::pagination::{ListQuery, ListResponse, SortDir};

/// Columns a list page orders and filters on.
pub(crate) struct ListColumns<C> {
    /// Text columns matched by `search`.
    pub search: Vec<C>,
    /// Columns a caller may name in `sort`.
    pub sort: Vec<C>,
    /// Primary key, the final tiebreak.
    pub id: C,
    /// Fallback sort key.
    pub updated_at: C,
}

const LIKE_ESCAPE: char = '\\';

/// Escapes `LIKE` metacharacters so `term` matches literally.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive substring filter over `columns`.
pub(crate) fn search_condition<C>(columns: &[C], term: &str) -> Condition
where
    C: ColumnTrait,
{
    let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
    columns.iter().fold(Condition::any(), |cond, column| {
        cond.add(
            Expr::expr(Func::lower(Expr::col(*column)))
                .like(LikeExpr::new(pattern.clone()).escape(LIKE_ESCAPE)),
        )
    })
}

/// Runs `select` under the envelope: search, count, sort, page.
///
/// Sort names outside `columns.sort` fall back to `updated_at` ascending;
/// `id` breaks ties so consecutive pages never overlap.
pub(crate) async fn fetch_page<E, C>(
    conn: &C,
    mut select: Select<E>,
    query: &ListQuery,
    columns: &ListColumns<E::Column>,
) -> Result<ListResponse<E::Model>, sea_orm::DbErr>
where
    E: EntityTrait,
    E::Model: Send + Sync + 'static,
    C: ConnectionTrait,
{
    if let Some(term) = query.search_term() {
        select = select.filter(search_condition(&columns.search, term));
    }

    let total = select.clone().count(conn).await?;

    let requested = query
        .sort
        .as_deref()
        .and_then(|name| columns.sort.iter().copied().find(|c| c.as_str() == name));
    let (sort, order) = match requested {
        Some(column) => (column, order_of(query.dir)),
        None => (columns.updated_at, Order::Asc),
    };

    let items = select
        .order_by(sort, order.clone())
        .order_by(columns.id, order)
        .offset(query.offset)
        .limit(query.limit)
        .all(conn)
        .await?;

    Ok(ListResponse::new(items, total))
}

const fn order_of(dir: SortDir) -> Order {
    match dir {
        SortDir::Asc => Order::Asc,
        SortDir::Desc => Order::Desc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c:\\tmp"), "c:\\\\tmp");
        assert_eq!(escape_like("plain"), "plain");
    }
}
