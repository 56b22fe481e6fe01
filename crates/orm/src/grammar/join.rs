//! JOIN compiler
//!
//! Value conditions are rendered as escaped literals so that the builder's
//! bindings only ever cover WHERE placeholders.

use crate::backends::quote_value;
use crate::query::{JoinCondition, JoinSpec};

pub fn compile_joins(joins: &[JoinSpec]) -> String {
    joins
        .iter()
        .map(compile_join)
        .collect::<Vec<_>>()
        .join(" ")
}

fn compile_join(join: &JoinSpec) -> String {
    match join {
        JoinSpec::Simple {
            join_type,
            table,
            first,
            operator,
            second,
        } => format!("{} JOIN {} ON {} {} {}", join_type, table, first, operator, second),
        JoinSpec::Clause(clause) => {
            if clause.conditions.is_empty() {
                return format!("{} JOIN {}", clause.join_type, clause.table);
            }
            let mut conditions = String::new();
            for (index, condition) in clause.conditions.iter().enumerate() {
                if index > 0 {
                    conditions.push(' ');
                    conditions.push_str(&condition.boolean().to_string());
                    conditions.push(' ');
                }
                conditions.push_str(&compile_condition(condition));
            }
            format!("{} JOIN {} ON {}", clause.join_type, clause.table, conditions)
        }
    }
}

fn compile_condition(condition: &JoinCondition) -> String {
    match condition {
        JoinCondition::Column {
            first,
            operator,
            second,
            ..
        } => format!("{} {} {}", first, operator, second),
        JoinCondition::Value {
            column,
            operator,
            value,
            ..
        } => format!("{} {} {}", column, operator, quote_value(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{JoinClause, JoinType};
    use serde_json::json;

    #[test]
    fn test_clause_join_inlines_values() {
        let join = JoinClause::new(JoinType::Left, "wp_postmeta AS pm")
            .on("wp_posts.ID", "pm.post_id")
            .where_eq("pm.meta_key", "it's")
            .or_where("pm.meta_value", json!(null))
            .where_eq("pm.flag", true)
            .where_eq("pm.count", 3);

        assert_eq!(
            compile_joins(&[JoinSpec::Clause(join)]),
            "LEFT JOIN wp_postmeta AS pm ON wp_posts.ID = pm.post_id \
             AND pm.meta_key = 'it\\'s' OR pm.meta_value = NULL AND pm.flag = 1 AND pm.count = 3"
        );
    }

    #[test]
    fn test_multiple_joins() {
        let joins = vec![
            JoinSpec::Clause(JoinClause::new(JoinType::Inner, "wp_a").on("wp_a.id", "wp_b.a_id")),
            JoinSpec::Clause(JoinClause::new(JoinType::Right, "wp_c")),
        ];
        assert_eq!(
            compile_joins(&joins),
            "INNER JOIN wp_a ON wp_a.id = wp_b.a_id RIGHT JOIN wp_c"
        );
    }
}
