use super::*;
use crate::expr::Expr;
use crate::select::SelectQb;

fn sel(table: &str, cond: &str, value: i32) -> SelectQb {
    SelectQb::new(table)
        .columns(["id"])
        .where_template(cond, vec![value])
}

fn params(built: &BuiltQuery) -> String {
    format!("{:?}", built.params)
}

#[test]
fn distinct_basic() {
    let built = UnionQb::from_parts(UnionOp::Distinct, [sel("a", "x > ?", 10), sel("b", "y < ?", 5)])
        .order_by("id")
        .limit(100)
        .offset(2)
        .placeholder_format(PlaceholderFormat::Dollar)
        .must_render();

    assert_eq!(
        built.sql,
        "(SELECT id FROM a WHERE x > $1) UNION (SELECT id FROM b WHERE y < $2) ORDER BY id LIMIT 100 OFFSET 2"
    );
    assert_eq!(params(&built), "[10, 5]");
}

#[test]
fn all_three_parts() {
    let built = UnionQb::from_parts(
        UnionOp::All,
        [sel("t1", "a = ?", 1), sel("t2", "b = ?", 2), sel("t3", "c = ?", 3)],
    )
    .placeholder_format(PlaceholderFormat::Dollar)
    .must_render();

    assert_eq!(
        built.sql,
        "(SELECT id FROM t1 WHERE a = $1) UNION ALL (SELECT id FROM t2 WHERE b = $2) UNION ALL (SELECT id FROM t3 WHERE c = $3)"
    );
    assert_eq!(built.sql.matches("UNION ALL").count(), 2);
    assert_eq!(params(&built), "[1, 2, 3]");
}

#[test]
fn appended_operator_belongs_to_new_segment() {
    let built = UnionQb::new()
        .union(sel("a", "x = ?", 1))
        .union_all(sel("b", "y = ?", 2))
        .union(sel("c", "z = ?", 3))
        .placeholder_format(PlaceholderFormat::Dollar)
        .must_render();

    assert_eq!(
        built.sql,
        "(SELECT id FROM a WHERE x = $1) UNION ALL (SELECT id FROM b WHERE y = $2) UNION (SELECT id FROM c WHERE z = $3)"
    );
}

#[test]
fn single_segment_has_no_keyword() {
    let built = UnionQb::new().union_all(sel("a", "x = ?", 1)).must_render();
    assert_eq!(built.sql, "(SELECT id FROM a WHERE x = ?)");
    assert!(!built.sql.contains("UNION"));
}

#[test]
fn empty_union_fails() {
    let err = UnionQb::new().order_by("id").render().unwrap_err();
    assert!(matches!(err, WeaveError::EmptyUnion));
    assert!(err.is_empty_composite());
}

#[test]
fn zero_limit_and_offset_are_rendered() {
    let built = UnionQb::new()
        .union(SelectQb::new("a"))
        .limit(0)
        .offset(0)
        .must_render();
    assert_eq!(built.sql, "(SELECT * FROM a) LIMIT 0 OFFSET 0");
}

#[test]
fn suffix_follows_clauses_and_args() {
    let built = UnionQb::new()
        .union(sel("a", "x > ?", 7))
        .union(sel("b", "y < ?", 9))
        .order_by_all(["id DESC", "name"])
        .suffix(Expr::raw("/* suffix */"))
        .suffix(Expr::template_values("FETCH FIRST ? ROWS ONLY", vec![3i32]))
        .placeholder_format(PlaceholderFormat::Dollar)
        .must_render();
    assert_eq!(
        built.sql,
        "(SELECT id FROM a WHERE x > $1) UNION (SELECT id FROM b WHERE y < $2) ORDER BY id DESC, name /* suffix */ FETCH FIRST $3 ROWS ONLY"
    );
    assert_eq!(params(&built), "[7, 9, 3]");
}

#[test]
fn compact_collapses_newlines() {
    let built = UnionQb::new()
        .union(SelectQb::new("a").columns(["id"]))
        .union(SelectQb::new("b").columns(["id"]))
        .suffix(Expr::raw("/* line1 */\n/* line2 */"))
        .compact()
        .placeholder_format(PlaceholderFormat::Dollar)
        .must_render();
    assert_eq!(
        built.sql,
        "(SELECT id FROM a) UNION (SELECT id FROM b) /* line1 */ /* line2 */"
    );
}

#[test]
fn segment_error_names_index() {
    let broken = crate::case::CaseQb::new();
    let err = UnionQb::new()
        .union(sel("a", "x = ?", 1))
        .union(SelectQb::new("b").column_as(broken, "c"))
        .render()
        .unwrap_err();
    match err {
        WeaveError::UnionSegment { index, source } => {
            assert_eq!(index, 1);
            assert!(matches!(*source, WeaveError::EmptyCase));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn branches_do_not_interfere() {
    let base = UnionQb::new().union(sel("a", "x = ?", 1));
    let left = base.clone().union(sel("b", "y = ?", 2));
    let right = base.clone().union_all(sel("c", "z = ?", 3)).limit(5);

    assert_eq!(base.len(), 1);
    assert_eq!(
        left.must_render().sql,
        "(SELECT id FROM a WHERE x = ?) UNION (SELECT id FROM b WHERE y = ?)"
    );
    assert_eq!(
        right.must_render().sql,
        "(SELECT id FROM a WHERE x = ?) UNION ALL (SELECT id FROM c WHERE z = ?) LIMIT 5"
    );
    assert_eq!(base.must_render().sql, "(SELECT id FROM a WHERE x = ?)");
}

#[test]
fn render_is_repeatable() {
    let u = UnionQb::new()
        .union(sel("a", "x = ?", 1))
        .union(sel("b", "y = ?", 2))
        .placeholder_format(PlaceholderFormat::Colon);
    let first = u.must_render();
    let second = u.must_render();
    assert_eq!(first.sql, second.sql);
    assert_eq!(params(&first), params(&second));
}

#[test]
fn nested_union_is_renumbered_by_parent() {
    let inner = UnionQb::new()
        .union(sel("a", "x = ?", 1))
        .union(sel("b", "y = ?", 2))
        .placeholder_format(PlaceholderFormat::Dollar);
    let built = UnionQb::new()
        .union(inner)
        .union_all(sel("c", "z = ?", 3))
        .placeholder_format(PlaceholderFormat::Dollar)
        .must_render();
    assert_eq!(
        built.sql,
        "((SELECT id FROM a WHERE x = $1) UNION (SELECT id FROM b WHERE y = $2)) UNION ALL (SELECT id FROM c WHERE z = $3)"
    );
}
