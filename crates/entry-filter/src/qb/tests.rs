use super::*;
use crate::config::FilterConfig;
use crate::error::FilterError;
use crate::item::FilterItem;
use crate::operator::Operator;
use crate::sink::QueryPredicateSink;
use crate::where_clause::WhereClause;
use serde_json::{Value, json};

fn compile(items: &[FilterItem]) -> (String, ParamList) {
    let filter = WhereClause::from_items(items).unwrap();
    ExprSink::compile(&filter).unwrap().to_sql()
}

// ==================== ExprSink ====================

#[test]
fn direct_column_compiles_to_single_comparison() {
    let (sql, params) = compile(&[FilterItem::leaf("title", 5).operator(">")]);
    assert_eq!(sql, "entries.title > $1");
    assert_eq!(params.values(), vec![&json!(5)]);
}

#[test]
fn custom_field_compiles_to_tag_and_value() {
    let (sql, params) = compile(&[FilterItem::leaf("custom_attr", "X")]);
    assert_eq!(
        sql,
        "EXISTS (SELECT 1 FROM entry_data WHERE entry_data.entry_id = entries.id \
         AND entry_data.content_type_field_short_tag = $1 AND entry_data.data = $2)"
    );
    assert_eq!(params.values(), vec![&json!("custom_attr"), &json!("X")]);
}

#[test]
fn each_custom_field_gets_its_own_subquery() {
    let (sql, params) = compile(&[
        FilterItem::leaf("color", "red"),
        FilterItem::leaf("size", "large"),
        FilterItem::leaf("title", "A"),
    ]);
    assert_eq!(
        sql,
        "EXISTS (SELECT 1 FROM entry_data WHERE entry_data.entry_id = entries.id \
         AND entry_data.content_type_field_short_tag = $1 AND entry_data.data = $2) \
         AND EXISTS (SELECT 1 FROM entry_data WHERE entry_data.entry_id = entries.id \
         AND entry_data.content_type_field_short_tag = $3 AND entry_data.data = $4) \
         AND entries.title = $5"
    );
    assert_eq!(
        params.values(),
        vec![&json!("color"), &json!("red"), &json!("size"), &json!("large"), &json!("A")]
    );
}

#[test]
fn custom_field_under_group_and_or() {
    let (sql, _) = compile(&[FilterItem::group(vec![
        FilterItem::leaf("color", "red"),
        FilterItem::leaf("color", "blue").relation("or"),
    ])]);
    assert_eq!(
        sql,
        "EXISTS (SELECT 1 FROM entry_data WHERE entry_data.entry_id = entries.id \
         AND entry_data.content_type_field_short_tag = $1 AND entry_data.data = $2) \
         OR EXISTS (SELECT 1 FROM entry_data WHERE entry_data.entry_id = entries.id \
         AND entry_data.content_type_field_short_tag = $3 AND entry_data.data = $4)"
    );
}

#[test]
fn or_siblings_inside_a_group() {
    let (sql, _) = compile(&[FilterItem::group(vec![
        FilterItem::leaf("title", "A"),
        FilterItem::leaf("title", "B").relation("or"),
    ])]);
    assert_eq!(sql, "entries.title = $1 OR entries.title = $2");
}

#[test]
fn or_group_attaches_to_preceding_sibling() {
    let (sql, params) = compile(&[
        FilterItem::leaf("entry_status_id", 1),
        FilterItem::group(vec![
            FilterItem::leaf("title", "A"),
            FilterItem::leaf("title", "B"),
        ])
        .relation("or"),
    ]);
    assert_eq!(
        sql,
        "entries.entry_status_id = $1 OR (entries.title = $2 AND entries.title = $3)"
    );
    assert_eq!(params.len(), 3);
}

#[test]
fn custom_field_keeps_its_pair_together_under_or() {
    let (sql, _) = compile(&[
        FilterItem::leaf("title", "%rust%").operator("like"),
        FilterItem::leaf("color", "red").relation("or"),
    ]);
    assert_eq!(
        sql,
        "entries.title LIKE $1 OR \
         EXISTS (SELECT 1 FROM entry_data WHERE entry_data.entry_id = entries.id \
         AND entry_data.content_type_field_short_tag = $2 AND entry_data.data = $3)"
    );
}

#[test]
fn keyword_operators() {
    let (sql, params) = compile(&[
        FilterItem::leaf("id", json!([1, 2, 3])).operator("in"),
        FilterItem::leaf("author_id", json!([4])).operator("not in"),
        FilterItem::leaf("created_at", json!(["2024-01-01", "2024-12-31"])).operator("between"),
        FilterItem::leaf("entry_status_id", json!([5, 9])).operator("not between"),
        FilterItem::leaf("route", Value::Null).operator("is null"),
        FilterItem::leaf("url_title", Value::Null).operator("is not null"),
        FilterItem::leaf("title", "%draft%").operator("not like"),
    ]);
    assert_eq!(
        sql,
        "entries.id IN ($1, $2, $3) \
         AND entries.author_id NOT IN ($4) \
         AND entries.created_at BETWEEN $5 AND $6 \
         AND entries.entry_status_id NOT BETWEEN $7 AND $8 \
         AND entries.route IS NULL \
         AND entries.url_title IS NOT NULL \
         AND entries.title NOT LIKE $9"
    );
    assert_eq!(params.len(), 9);
}

#[test]
fn empty_lists() {
    let (sql, params) = compile(&[
        FilterItem::leaf("id", json!([])).operator("in"),
        FilterItem::leaf("id", json!([])).operator("not in").relation("or"),
    ]);
    assert_eq!(sql, "1=0 OR 1=1");
    assert!(params.is_empty());
}

#[test]
fn in_without_array_is_invalid_value() {
    let filter = WhereClause::from_items(&[FilterItem::leaf("id", 1).operator("in")]).unwrap();
    let err = ExprSink::compile(&filter).unwrap_err();
    assert!(matches!(err, FilterError::InvalidValue { operator: "in", .. }));
}

#[test]
fn between_needs_a_pair() {
    for value in [json!([1]), json!([1, 2, 3]), json!("1..2")] {
        let filter =
            WhereClause::from_items(&[FilterItem::leaf("id", value).operator("not between")])
                .unwrap();
        let err = ExprSink::compile(&filter).unwrap_err();
        assert!(matches!(
            err,
            FilterError::InvalidValue {
                operator: "not between",
                ..
            }
        ));
    }
}

#[test]
fn first_error_wins() {
    let filter = WhereClause::from_items(&[
        FilterItem::leaf("id", 1).operator("between"),
        FilterItem::leaf("id", 1).operator("in"),
    ])
    .unwrap();
    let err = ExprSink::compile(&filter).unwrap_err();
    assert!(matches!(err, FilterError::InvalidValue { operator: "between", .. }));
}

#[test]
fn invalid_column_is_rejected() {
    let filter = WhereClause::leaf("title; DROP TABLE entries", Operator::Eq, json!(1));
    let err = ExprSink::compile(&filter).unwrap_err();
    assert!(matches!(err, FilterError::Validation(_)));
}

#[test]
fn quoted_columns_are_normalized() {
    let filter = WhereClause::leaf("\"entries\".\"Title\"", Operator::Eq, json!("A"));
    let (sql, _) = ExprSink::compile(&filter).unwrap().to_sql();
    assert_eq!(sql, "\"entries\".\"Title\" = $1");
}

#[test]
fn empty_filter_renders_nothing() {
    let sink = ExprSink::new();
    assert!(sink.is_empty());
    let expr = sink.finish().unwrap();
    assert!(expr.is_empty());
    assert_eq!(expr.to_sql().0, "");

    let (sql, _) = compile(&[]);
    assert_eq!(sql, "");

    let (sql, _) = compile(&[FilterItem::group(vec![]), FilterItem::leaf("id", 3)]);
    assert_eq!(sql, "entries.id = $1");
}

#[test]
fn sink_can_be_driven_directly() {
    let mut sink = ExprSink::new();
    sink.where_compare("entries.id", Operator::Gte, &json!(10));
    sink.or_where_nested(|q| {
        q.where_null("entries.route");
        q.where_in("entries.author_id", &json!([1, 2]));
    });
    assert!(!sink.is_empty());

    let (sql, params) = sink.finish().unwrap().to_sql();
    assert_eq!(
        sql,
        "entries.id >= $1 OR (entries.route IS NULL AND entries.author_id IN ($2, $3))"
    );
    assert_eq!(params.values(), vec![&json!(10), &json!(1), &json!(2)]);
}

#[test]
fn param_values_follow_json_types() {
    let (_, params) = compile(&[
        FilterItem::leaf("title", "A"),
        FilterItem::leaf("id", 7),
        FilterItem::leaf("entry_status_id", 1.5),
        FilterItem::leaf("color", true),
    ]);
    assert_eq!(
        params.values(),
        vec![&json!("A"), &json!(7), &json!(1.5), &json!("color"), &json!(true)]
    );
    assert_eq!(params.as_refs().len(), 5);
}

// ==================== EntrySelect ====================

#[test]
fn select_without_filters() {
    let built = EntrySelect::new().build().unwrap();
    assert_eq!(built.sql, "SELECT entries.* FROM entries");
    assert!(built.params.is_empty());
}

#[test]
fn select_direct_columns_skips_join() {
    let filter = WhereClause::from_items(&[FilterItem::leaf("author_id", 7)]).unwrap();
    let select = EntrySelect::new().filter(filter).limit(20).offset(40);

    let built = select.build().unwrap();
    assert_eq!(
        built.sql,
        "SELECT entries.* FROM entries WHERE entries.author_id = $1 LIMIT 20 OFFSET 40"
    );
    assert_eq!(built.params_ref().len(), 1);
}

#[test]
fn select_custom_field_uses_subquery() {
    let filter = WhereClause::from_items(&[
        FilterItem::leaf("author_id", 7),
        FilterItem::leaf("color", "red").relation("or"),
    ])
    .unwrap();

    let built = EntrySelect::new().filter(filter).build().unwrap();
    assert_eq!(
        built.sql,
        "SELECT entries.* FROM entries \
         WHERE entries.author_id = $1 OR \
         EXISTS (SELECT 1 FROM entry_data WHERE entry_data.entry_id = entries.id \
         AND entry_data.content_type_field_short_tag = $2 AND entry_data.data = $3)"
    );
}

#[test]
fn select_cols_and_multiple_filters() {
    let status = WhereClause::from_items(&[FilterItem::leaf("entry_status_id", 1)]).unwrap();
    let mut authors = WhereClause::from_items(&[FilterItem::leaf("author_id", 2)]).unwrap();
    authors.set_relation("or").unwrap();

    let built = EntrySelect::new()
        .select_cols(&["entries.id", "entries.title"])
        .filter(status)
        .filter(authors)
        .build()
        .unwrap();
    assert_eq!(
        built.sql,
        "SELECT entries.id, entries.title FROM entries \
         WHERE entries.entry_status_id = $1 OR entries.author_id = $2"
    );
}

#[test]
fn count_query() {
    let direct = WhereClause::from_items(&[FilterItem::leaf("id", 1)]).unwrap();
    let built = EntrySelect::new().filter(direct).limit(5).build_count().unwrap();
    assert_eq!(built.sql, "SELECT COUNT(*) FROM entries WHERE entries.id = $1");

    let custom = WhereClause::from_items(&[FilterItem::leaf("color", "red")]).unwrap();
    let built = EntrySelect::new().filter(custom).build_count().unwrap();
    assert!(built.sql.starts_with(
        "SELECT COUNT(*) FROM entries WHERE EXISTS (SELECT 1 FROM entry_data"
    ));
}

#[test]
fn select_cols_are_validated() {
    let built = EntrySelect::new()
        .select_cols(&["entries.id", "\"entries\".\"Title\""])
        .build()
        .unwrap();
    assert_eq!(built.sql, "SELECT entries.id, \"entries\".\"Title\" FROM entries");

    for bad in ["entries.id; DROP TABLE entries", "count(*)", "entries.*", ""] {
        let err = EntrySelect::new().select_cols(&[bad]).build().unwrap_err();
        assert!(matches!(err, FilterError::Validation(_)), "{bad}");
    }
}

#[test]
fn select_with_config() {
    let config = FilterConfig::from_toml_str(
        r#"
        [entity]
        table = "posts"
        key = "post_id"
        columns = ["slug"]

        [attributes]
        table = "post_meta"
        entity_key = "post_id"
        "#,
    )
    .unwrap();
    let resolver = crate::where_clause::EntryColumnResolver::new(config.clone());
    let filter = WhereClause::from_items_with(&[FilterItem::leaf("color", "red")], &resolver).unwrap();

    let built = EntrySelect::with_config(config).filter(filter).build().unwrap();
    assert_eq!(
        built.sql,
        "SELECT posts.* FROM posts \
         WHERE EXISTS (SELECT 1 FROM post_meta WHERE post_meta.post_id = posts.post_id \
         AND post_meta.content_type_field_short_tag = $1 AND post_meta.data = $2)"
    );
}

#[test]
fn select_reports_compile_errors() {
    let filter = WhereClause::from_items(&[FilterItem::leaf("id", "x").operator("between")]).unwrap();
    let err = EntrySelect::new().filter(filter).build().unwrap_err();
    assert!(matches!(err, FilterError::InvalidValue { .. }));
}
