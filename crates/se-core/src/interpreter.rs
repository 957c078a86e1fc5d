//! Applies one source's rules to its namespace index.
//!
//! Processing order within a source:
//!
//! 1. `Namespace` blocks, in document order. A block whose `Name` is not an
//!    exact namespace is resolved as a wildcard to a fixed list of matches
//!    first, then its operations run against each match in index order.
//! 2. Source-wide `Trim` and `Span`, in document order, over every namespace.
//! 3. `RemoveNamespace`, in document order, by exact name.
//!
//! Inside a block, operations run strictly in document order. Only the first
//! `RenameNS` of a block takes effect; later ones are ignored. Operations
//! after a rename address the renamed namespace.

use crate::error::EditError;
use crate::index::{InsertTime, NamespaceIndex};
use crate::pattern::substitute;
use crate::rules::RuleNode;
use crate::value::parse_numeric;

const SOURCE: &str = "Source";
const NAMESPACE: &str = "Namespace";

const SOURCE_KINDS: &[&str] = &["InsertTime", NAMESPACE, "Trim", "Span", "RemoveNamespace"];

const NAMESPACE_KINDS: &[&str] = &[
    "RenameNS",
    "DuplicateNS",
    "DeleteID",
    "MergeWithNS",
    "TrimNS",
    "ScaleID",
    "BoundID",
    "DeltaID",
    "AddValue",
    "InsertID",
    "InitAllID",
    "RenameID",
    "SpanNS",
];

/// What is known about a source before its snapshot is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePlan {
    /// Snapshot path as written in the document.
    pub file: String,
    pub insert_time: InsertTime,
}

/// Counts gathered while applying a source's rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Namespaces a `Namespace` block was applied to.
    pub namespaces: usize,
    /// Entries or points touched by operations.
    pub affected: usize,
    /// Namespaces removed by `RemoveNamespace`.
    pub removed: usize,
}

/// Validates a source node's structure and reads its file and insert time.
///
/// Rejects unknown node kinds anywhere in the tree and repeated
/// `InsertTime`, `Trim`, `Span` (per source) or `TrimNS` (per block).
pub fn plan_source(source: &RuleNode) -> Result<SourcePlan, EditError> {
    for child in &source.children {
        if !SOURCE_KINDS.contains(&child.kind.as_str()) {
            return Err(EditError::UnknownNode {
                parent: SOURCE.to_string(),
                kind: child.kind.clone(),
            });
        }
        if child.kind != NAMESPACE {
            reject_children(child)?;
        }
    }
    source.at_most_one("Trim")?;
    source.at_most_one("Span")?;
    let insert_time = source
        .at_most_one("InsertTime")?
        .map(|node| node.value().and_then(str::parse::<InsertTime>))
        .transpose()?
        .unwrap_or_default();

    for block in source.children_of(NAMESPACE) {
        if let Some(op) = block
            .children
            .iter()
            .find(|op| !NAMESPACE_KINDS.contains(&op.kind.as_str()))
        {
            return Err(EditError::UnknownNode {
                parent: NAMESPACE.to_string(),
                kind: op.kind.clone(),
            });
        }
        for op in &block.children {
            reject_children(op)?;
        }
        block.at_most_one("TrimNS")?;
    }

    let file = source.required_attr("File")?.to_string();
    Ok(SourcePlan { file, insert_time })
}

/// Leaf rules take attributes or a value, never nested rules.
fn reject_children(leaf: &RuleNode) -> Result<(), EditError> {
    match leaf.children.first() {
        Some(child) => Err(EditError::UnknownNode {
            parent: leaf.kind.clone(),
            kind: child.kind.clone(),
        }),
        None => Ok(()),
    }
}

/// Applies a source node's rules to `index`, which must have been built
/// with the source's insert time.
pub fn apply_source(index: &mut NamespaceIndex, source: &RuleNode) -> Result<ApplyReport, EditError> {
    let plan = plan_source(source)?;
    let mut interpreter = Interpreter {
        index,
        insert_time: plan.insert_time,
        report: ApplyReport::default(),
    };
    interpreter.apply(source)?;
    let report = interpreter.report;
    tracing::info!(
        file = %plan.file,
        namespaces = report.namespaces,
        affected = report.affected,
        removed = report.removed,
        "applied source rules"
    );
    Ok(report)
}

struct Interpreter<'a> {
    index: &'a mut NamespaceIndex,
    insert_time: InsertTime,
    report: ApplyReport,
}

impl Interpreter<'_> {
    fn apply(&mut self, source: &RuleNode) -> Result<(), EditError> {
        for block in source.children_of(NAMESPACE) {
            self.apply_block(block)?;
        }

        for node in &source.children {
            match node.kind.as_str() {
                "Trim" => {
                    let (start, end) = trim_window(node)?;
                    for name in self.namespace_names() {
                        self.report.affected +=
                            self.index.trim(&name, start, end, self.insert_time.offset())?;
                    }
                }
                "Span" => {
                    let runtime = int_attr(node, "RunTime")?;
                    for name in self.namespace_names() {
                        self.report.affected += self.index.span(&name, runtime)?;
                    }
                }
                _ => {}
            }
        }

        for node in source.children_of("RemoveNamespace") {
            self.index.remove_namespace(node.value()?)?;
            self.report.removed += 1;
        }
        Ok(())
    }

    fn namespace_names(&self) -> Vec<String> {
        self.index.names().map(str::to_string).collect()
    }

    fn apply_block(&mut self, block: &RuleNode) -> Result<(), EditError> {
        let name = block.required_attr("Name")?;
        let targets = if self.index.contains(name) {
            vec![name.to_string()]
        } else {
            self.index.match_namespaces(name)
        };
        if targets.is_empty() {
            return Err(EditError::NamespaceNotFound(name.to_string()));
        }
        tracing::debug!(pattern = name, ?targets, "resolved namespace block");

        for target in targets {
            tracing::info!(namespace = %target, "processing namespace");
            self.apply_operations(target, &block.children)?;
            self.report.namespaces += 1;
        }
        Ok(())
    }

    fn apply_operations(&mut self, namespace: String, ops: &[RuleNode]) -> Result<(), EditError> {
        let mut current = namespace;
        let mut renamed = false;
        for op in ops {
            let affected = match op.kind.as_str() {
                "RenameNS" => {
                    if renamed {
                        tracing::debug!(namespace = %current, "ignoring repeated RenameNS");
                        0
                    } else {
                        renamed = true;
                        let new_name = substitute(op.value()?, &current);
                        let count = self.index.rename_namespace_one(&current, &new_name)?;
                        current = new_name;
                        count
                    }
                }
                "DuplicateNS" => {
                    let new_name = substitute(op.value()?, &current);
                    self.index.copy_namespace_one(&current, &new_name)?
                }
                "DeleteID" => self.index.delete_id(&current, op.required_attr("ID")?)?,
                "MergeWithNS" => self.index.merge_into(&current, op.value()?)?,
                "TrimNS" => {
                    let (start, end) = trim_window(op)?;
                    self.index
                        .trim(&current, start, end, self.insert_time.offset())?
                }
                "ScaleID" => {
                    let precision = op
                        .attr("Precision")
                        .map(|text| parse_literal::<usize>(op, "Precision", text))
                        .transpose()?;
                    self.index.scale(
                        &current,
                        op.required_attr("ID")?,
                        float_attr(op, "Factor")?,
                        precision,
                    )?
                }
                "BoundID" => self.index.bound(
                    &current,
                    op.required_attr("ID")?,
                    optional_float(op, "Min")?,
                    optional_float(op, "Max")?,
                )?,
                "DeltaID" => self.index.delta(
                    &current,
                    op.required_attr("ID")?,
                    float_attr(op, "Delta")?,
                )?,
                "AddValue" => self.index.add_value(
                    &current,
                    op.required_attr("ID")?,
                    op.required_attr("Value")?,
                )?,
                "InsertID" => {
                    let interval = op
                        .attr("Interval")
                        .map(|text| parse_literal::<i64>(op, "Interval", text))
                        .transpose()?;
                    self.index.insert_id(
                        &current,
                        op.required_attr("ID")?,
                        op.required_attr("Value")?,
                        int_attr(op, "Time")?,
                        interval,
                    )?
                }
                "InitAllID" => self.index.init_all_ids(
                    &current,
                    op.required_attr("Value")?,
                    int_attr(op, "Time")?,
                )?,
                "RenameID" => self.index.rename_id(
                    &current,
                    op.required_attr("ID")?,
                    op.required_attr("NewID")?,
                )?,
                "SpanNS" => self.index.span(&current, int_attr(op, "RunTime")?)?,
                other => {
                    return Err(EditError::UnknownNode {
                        parent: NAMESPACE.to_string(),
                        kind: other.to_string(),
                    });
                }
            };
            self.report.affected += affected;
        }
        Ok(())
    }
}

fn parse_literal<T: std::str::FromStr>(
    node: &RuleNode,
    field: &'static str,
    text: &str,
) -> Result<T, EditError> {
    text.trim().parse().map_err(|_| EditError::InvalidLiteral {
        node: node.kind.clone(),
        field,
        value: text.to_string(),
    })
}

fn int_attr(node: &RuleNode, name: &'static str) -> Result<i64, EditError> {
    parse_literal(node, name, node.required_attr(name)?)
}

fn float_attr(node: &RuleNode, name: &'static str) -> Result<f64, EditError> {
    let text = node.required_attr(name)?;
    parse_numeric(text).ok_or_else(|| EditError::InvalidLiteral {
        node: node.kind.clone(),
        field: name,
        value: text.to_string(),
    })
}

fn optional_float(node: &RuleNode, name: &'static str) -> Result<Option<f64>, EditError> {
    node.attr(name).map(|_| float_attr(node, name)).transpose()
}

fn trim_window(node: &RuleNode) -> Result<(i64, i64), EditError> {
    Ok((int_attr(node, "StartTime")?, int_attr(node, "EndTime")?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{DataPoint, Entry};

    fn point(ns: &str, id: &str, value: &str, time: i64) -> Entry {
        Entry::Point(DataPoint::new(ns, id, value, time))
    }

    fn raw() -> Vec<Entry> {
        vec![
            point("cpu0", "load", "1", 1000),
            point("cpu1", "load", "2", 1000),
            point("mem", "used", "10", 1005),
            point("cpu0", "load", "3", 1010),
            point("cpu1", "load", "4", 1010),
            point("mem", "used", "20", 1020),
        ]
    }

    fn source() -> RuleNode {
        RuleNode::new("Source").with_attr("File", "capture.jsonl")
    }

    fn namespace(name: &str) -> RuleNode {
        RuleNode::new("Namespace").with_attr("Name", name)
    }

    fn run(source: &RuleNode) -> Result<NamespaceIndex, EditError> {
        let plan = plan_source(source)?;
        let mut index = NamespaceIndex::build(raw(), plan.insert_time);
        apply_source(&mut index, source)?;
        Ok(index)
    }

    fn values(index: &NamespaceIndex, ns: &str) -> Vec<String> {
        index
            .entries(ns)
            .unwrap()
            .iter()
            .flat_map(Entry::points)
            .map(|p| p.value.clone())
            .collect()
    }

    #[test]
    fn plan_reads_file_and_insert_time() {
        let node = source().with_child(RuleNode::new("InsertTime").with_text("250"));
        let plan = plan_source(&node).unwrap();
        assert_eq!(plan.file, "capture.jsonl");
        assert_eq!(plan.insert_time, InsertTime::Offset(250));

        let node = source().with_child(RuleNode::new("InsertTime").with_text("Append"));
        assert_eq!(plan_source(&node).unwrap().insert_time, InsertTime::Append);
        assert_eq!(plan_source(&source()).unwrap().insert_time, InsertTime::Absent);
    }

    #[test]
    fn plan_rejects_structural_errors() {
        let twice = source()
            .with_child(RuleNode::new("Span").with_attr("RunTime", "1"))
            .with_child(RuleNode::new("Span").with_attr("RunTime", "2"));
        assert!(matches!(plan_source(&twice), Err(EditError::DuplicateNode { .. })));

        let unknown = source().with_child(RuleNode::new("Shuffle"));
        assert!(matches!(plan_source(&unknown), Err(EditError::UnknownNode { .. })));

        let unknown_op = source().with_child(namespace("mem").with_child(RuleNode::new("Sort")));
        assert!(matches!(plan_source(&unknown_op), Err(EditError::UnknownNode { .. })));

        let nested_leaf = source().with_child(
            RuleNode::new("Trim")
                .with_attr("StartTime", "0")
                .with_child(RuleNode::new("Bogus")),
        );
        assert_eq!(
            plan_source(&nested_leaf).unwrap_err(),
            EditError::UnknownNode {
                parent: "Trim".into(),
                kind: "Bogus".into()
            }
        );

        let nested_op = source().with_child(
            namespace("mem").with_child(
                RuleNode::new("ScaleID")
                    .with_attr("ID", "used")
                    .with_attr("Factor", "2")
                    .with_child(RuleNode::new("Shuffle")),
            ),
        );
        assert_eq!(
            plan_source(&nested_op).unwrap_err(),
            EditError::UnknownNode {
                parent: "ScaleID".into(),
                kind: "Shuffle".into()
            }
        );

        let bad_time = source().with_child(RuleNode::new("InsertTime").with_text("soon"));
        assert!(matches!(plan_source(&bad_time), Err(EditError::InvalidLiteral { .. })));

        let no_file = RuleNode::new("Source");
        assert!(matches!(plan_source(&no_file), Err(EditError::MissingAttribute { .. })));
    }

    #[test]
    fn wildcard_block_applies_to_every_match() {
        let node = source().with_child(
            namespace("CPU*").with_child(
                RuleNode::new("ScaleID")
                    .with_attr("ID", "load")
                    .with_attr("Factor", "10"),
            ),
        );
        let index = run(&node).unwrap();
        assert_eq!(values(&index, "cpu0"), ["10", "30"]);
        assert_eq!(values(&index, "cpu1"), ["20", "40"]);
        assert_eq!(values(&index, "mem"), ["10", "20"]);
    }

    #[test]
    fn missing_namespace_is_fatal() {
        let node = source().with_child(namespace("disk*"));
        assert_eq!(
            run(&node).unwrap_err(),
            EditError::NamespaceNotFound("disk*".into())
        );
    }

    #[test]
    fn only_first_rename_counts_and_later_ops_follow_it() {
        let node = source().with_child(
            namespace("mem")
                .with_child(RuleNode::new("RenameNS").with_text("memory"))
                .with_child(RuleNode::new("RenameNS").with_text("ignored"))
                .with_child(RuleNode::new("DuplicateNS").with_text("*_a"))
                .with_child(RuleNode::new("DuplicateNS").with_text("*_b"))
                .with_child(
                    RuleNode::new("AddValue")
                        .with_attr("ID", "used")
                        .with_attr("Value", "0.5"),
                ),
        );
        let index = run(&node).unwrap();
        let names: Vec<_> = index.names().collect();
        assert_eq!(names, ["cpu0", "cpu1", "memory", "memory_a", "memory_b"]);
        assert_eq!(values(&index, "memory"), ["10.5", "20.5"]);
        assert_eq!(values(&index, "memory_a"), ["10", "20"]);
    }

    #[test]
    fn source_trim_span_then_remove() {
        let node = source()
            .with_child(RuleNode::new("RemoveNamespace").with_text("cpu1"))
            .with_child(RuleNode::new("Span").with_attr("RunTime", "30"))
            .with_child(
                RuleNode::new("Trim")
                    .with_attr("StartTime", "0")
                    .with_attr("EndTime", "10"),
            );
        let index = run(&node).unwrap();
        assert!(!index.contains("cpu1"));
        // Span runs first (document order): cpu0 0,10 -> 0,30 then trim keeps 0.
        let times: Vec<_> = index.entries("cpu0").unwrap().iter().map(Entry::arrival_time).collect();
        assert_eq!(times, [0]);
        let times: Vec<_> = index.entries("mem").unwrap().iter().map(Entry::arrival_time).collect();
        assert_eq!(times, [0]);
    }

    #[test]
    fn remove_requires_exact_name() {
        let node = source().with_child(RuleNode::new("RemoveNamespace").with_text("cpu*"));
        assert_eq!(
            run(&node).unwrap_err(),
            EditError::NamespaceNotFound("cpu*".into())
        );
    }

    #[test]
    fn trim_ns_uses_insert_time_offset() {
        let node = source()
            .with_child(RuleNode::new("InsertTime").with_text("100"))
            .with_child(
                namespace("mem").with_child(
                    RuleNode::new("TrimNS")
                        .with_attr("StartTime", "5")
                        .with_attr("EndTime", "15"),
                ),
            );
        let index = run(&node).unwrap();
        let times: Vec<_> = index.entries("mem").unwrap().iter().map(Entry::arrival_time).collect();
        assert_eq!(times, [115]);
    }

    #[test]
    fn merge_with_ns_and_bound() {
        let node = source().with_child(
            namespace("cpu1")
                .with_child(RuleNode::new("MergeWithNS").with_text("cpu0"))
                .with_child(RuleNode::new("BoundID").with_attr("ID", "load").with_attr("Max", "3")),
        );
        let index = run(&node).unwrap();
        assert_eq!(values(&index, "cpu0"), ["1", "2", "3", "4"]);
        assert_eq!(values(&index, "cpu1"), ["2", "3"]);
    }

    #[test]
    fn literal_and_attribute_errors_are_fatal() {
        let bad_factor = source().with_child(
            namespace("mem").with_child(
                RuleNode::new("ScaleID")
                    .with_attr("ID", "used")
                    .with_attr("Factor", "double"),
            ),
        );
        assert!(matches!(run(&bad_factor), Err(EditError::InvalidLiteral { .. })));

        let no_id = source().with_child(namespace("mem").with_child(RuleNode::new("DeleteID")));
        assert_eq!(
            run(&no_id).unwrap_err(),
            EditError::MissingAttribute {
                node: "DeleteID".into(),
                attribute: "ID"
            }
        );

        let no_limits = source().with_child(
            namespace("mem").with_child(RuleNode::new("BoundID").with_attr("ID", "used")),
        );
        assert!(matches!(run(&no_limits), Err(EditError::MissingBounds { .. })));
    }

    #[test]
    fn rename_to_own_name_is_a_no_op() {
        let node = source().with_child(
            namespace("*")
                .with_child(RuleNode::new("RenameNS").with_text("*"))
                .with_child(
                    RuleNode::new("ScaleID")
                        .with_attr("ID", "*")
                        .with_attr("Factor", "2"),
                ),
        );
        let index = run(&node).unwrap();
        assert_eq!(index.names().collect::<Vec<_>>(), ["cpu0", "cpu1", "mem"]);
        assert_eq!(values(&index, "mem"), ["20", "40"]);
    }

    #[test]
    fn insert_init_delta_and_rename_id() {
        let node = source().with_child(
            namespace("mem")
                .with_child(
                    RuleNode::new("InitAllID")
                        .with_attr("Value", "0")
                        .with_attr("Time", "0"),
                )
                .with_child(
                    RuleNode::new("InsertID")
                        .with_attr("ID", "mark")
                        .with_attr("Value", "x")
                        .with_attr("Time", "0")
                        .with_attr("Interval", "10"),
                )
                .with_child(
                    RuleNode::new("DeltaID")
                        .with_attr("ID", "used")
                        .with_attr("Delta", "-1"),
                )
                .with_child(
                    RuleNode::new("RenameID")
                        .with_attr("ID", "used")
                        .with_attr("NewID", "bytes"),
                ),
        );
        let index = run(&node).unwrap();
        let points: Vec<_> = index
            .entries("mem")
            .unwrap()
            .iter()
            .flat_map(Entry::points)
            .map(|p| (p.id.as_str(), p.value.as_str(), p.arrival_time))
            .collect();
        assert_eq!(
            points,
            [
                ("mark", "x", 0),
                ("bytes", "-1", 0),
                ("bytes", "9", 0),
                ("mark", "x", 10),
                ("bytes", "19", 15),
            ]
        );
    }
}
