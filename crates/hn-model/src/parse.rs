//! Independent re-parser for emitted artifacts.
//!
//! Shares only the row tags with the emitter. Rows are read header-less and
//! flexible with every field trimmed, so hand-edited files with spaces after
//! the commas parse the same. Blank lines carry no meaning.

use std::collections::BTreeMap;

use hn_windkessel::{EdgeKind, NodeKind};

/// A row that could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Malformed {
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub line: u64,
    pub fields: Vec<String>,
}

impl Row {
    fn tag(&self) -> &str {
        self.fields.first().map(String::as_str).unwrap_or("")
    }

    fn field(&self, i: usize) -> Option<&str> {
        self.fields
            .get(i)
            .map(String::as_str)
            .filter(|f| !f.is_empty())
    }

    fn is_blank(&self) -> bool {
        self.fields.iter().all(|f| f.is_empty())
    }
}

/// All non-blank rows, plus CSV-level errors.
pub fn read_rows(content: &str) -> (Vec<Row>, Vec<Malformed>) {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    let mut errors = Vec::new();
    for result in rdr.records() {
        match result {
            Ok(record) => {
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                let row = Row {
                    line,
                    fields: record.iter().map(str::to_string).collect(),
                };
                if !row.is_blank() {
                    rows.push(row);
                }
            }
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                errors.push(Malformed {
                    line,
                    reason: e.to_string(),
                });
            }
        }
    }
    (rows, errors)
}

fn malformed(row: &Row, reason: impl Into<String>) -> Malformed {
    Malformed {
        line: row.line,
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRow {
    pub name: String,
    /// `(main node, model node)` pairs.
    pub pairs: Vec<(String, String)>,
    pub line: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouplingRow {
    pub circuit: String,
    pub main_node: String,
    pub model_node: String,
    pub line: u64,
}

/// Parsed topology artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologyDoc {
    pub run: BTreeMap<String, String>,
    pub networks: Vec<NetworkRow>,
    pub couplings: Vec<CouplingRow>,
    pub nodes: Vec<(String, u64)>,
    pub malformed: Vec<Malformed>,
}

pub fn parse_topology(content: &str) -> TopologyDoc {
    let (rows, errors) = read_rows(content);
    let mut doc = TopologyDoc {
        malformed: errors,
        ..TopologyDoc::default()
    };

    for row in &rows {
        match row.tag() {
            "type" => {}
            "run" | "time" | "material" | "solver" => match row.field(1) {
                Some(v) => {
                    doc.run.insert(row.tag().to_string(), v.to_string());
                }
                None => doc.malformed.push(malformed(row, "run setting without a value")),
            },
            "moc" => {
                let Some(name) = row.field(1) else {
                    doc.malformed.push(malformed(row, "network row without a name"));
                    continue;
                };
                let mut rest: Vec<&String> = row.fields[2..].iter().collect();
                while rest.last().is_some_and(|f| f.is_empty()) {
                    rest.pop();
                }
                if rest.len() % 2 != 0 || rest.iter().any(|f| f.is_empty()) {
                    doc.malformed
                        .push(malformed(row, "network row needs (main node, model node) pairs"));
                    continue;
                }
                doc.networks.push(NetworkRow {
                    name: name.to_string(),
                    pairs: rest
                        .chunks(2)
                        .map(|p| (p[0].to_string(), p[1].to_string()))
                        .collect(),
                    line: row.line,
                });
            }
            "lumped" => match (row.field(1), row.field(2), row.field(3)) {
                (Some(c), Some(main), Some(model)) => doc.couplings.push(CouplingRow {
                    circuit: c.to_string(),
                    main_node: main.to_string(),
                    model_node: model.to_string(),
                    line: row.line,
                }),
                _ => doc
                    .malformed
                    .push(malformed(row, "coupling row needs circuit, main node and model node")),
            },
            "node" => match row.field(1) {
                Some(n) => doc.nodes.push((n.to_string(), row.line)),
                None => doc.malformed.push(malformed(row, "node row without a name")),
            },
            other => doc
                .malformed
                .push(malformed(row, format!("unknown row type '{}'", other))),
        }
    }
    doc
}

#[derive(Debug, Clone, PartialEq)]
pub struct VesselRow {
    pub id: String,
    pub start: String,
    pub end: String,
    /// Length in metres.
    pub length: f64,
    pub line: u64,
}

/// Parsed geometry artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryDoc {
    pub vessels: Vec<VesselRow>,
    pub hearts: Vec<String>,
    pub nodes: Vec<(String, u64)>,
    pub periphery: Vec<String>,
    pub malformed: Vec<Malformed>,
}

pub fn parse_geometry(content: &str) -> GeometryDoc {
    let (rows, errors) = read_rows(content);
    let mut doc = GeometryDoc {
        malformed: errors,
        ..GeometryDoc::default()
    };

    for row in &rows {
        match row.tag() {
            "type" => {}
            "vis_f" => {
                let (Some(id), Some(start), Some(end)) = (row.field(1), row.field(3), row.field(4))
                else {
                    doc.malformed
                        .push(malformed(row, "vessel row needs id, start node and end node"));
                    continue;
                };
                // diameters, thicknesses, length
                let bad_geometry = (5..=9).find(|&i| {
                    !row.field(i)
                        .and_then(|f| f.parse::<f64>().ok())
                        .is_some_and(|v| v.is_finite() && v > 0.0)
                });
                if let Some(col) = bad_geometry {
                    doc.malformed.push(malformed(
                        row,
                        format!("vessel '{}' has a missing or non-positive value in column {}", id, col + 1),
                    ));
                    continue;
                }
                let length = row
                    .field(9)
                    .and_then(|f| f.parse::<f64>().ok())
                    .unwrap_or_default();
                doc.vessels.push(VesselRow {
                    id: id.to_string(),
                    start: start.to_string(),
                    end: end.to_string(),
                    length,
                    line: row.line,
                });
            }
            "heart" | "node" | "perif" => {
                let Some(name) = row.field(1) else {
                    doc.malformed.push(malformed(row, "declaration without an identifier"));
                    continue;
                };
                let name = name.to_string();
                match row.tag() {
                    "heart" => doc.hearts.push(name),
                    "node" => doc.nodes.push((name, row.line)),
                    _ => doc.periphery.push(name),
                }
            }
            other => doc
                .malformed
                .push(malformed(row, format!("unknown row type '{}'", other))),
        }
    }
    doc
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRow {
    pub kind: EdgeKind,
    pub name: String,
    pub start: String,
    pub end: String,
    pub line: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRow {
    pub kind: NodeKind,
    pub name: String,
    pub line: u64,
}

/// Parsed circuit artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CircuitDoc {
    pub edges: Vec<EdgeRow>,
    pub nodes: Vec<NodeRow>,
    pub malformed: Vec<Malformed>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Edges,
    Nodes,
}

pub fn parse_circuit(content: &str) -> CircuitDoc {
    let (rows, errors) = read_rows(content);
    let mut doc = CircuitDoc {
        malformed: errors,
        ..CircuitDoc::default()
    };
    let mut section = Section::None;

    for row in &rows {
        match row.tag() {
            "data of edges" => {
                section = Section::Edges;
                continue;
            }
            "data of nodes" => {
                section = Section::Nodes;
                continue;
            }
            "type" => continue,
            _ => {}
        }

        match section {
            Section::None => doc
                .malformed
                .push(malformed(row, "row outside of an edge or node section")),
            Section::Edges => {
                let Some(kind) = EdgeKind::parse(row.tag()) else {
                    doc.malformed
                        .push(malformed(row, format!("unknown element type '{}'", row.tag())));
                    continue;
                };
                match (row.field(1), row.field(2), row.field(3), row.field(5)) {
                    (Some(name), Some(start), Some(end), Some(_)) => doc.edges.push(EdgeRow {
                        kind,
                        name: name.to_string(),
                        start: start.to_string(),
                        end: end.to_string(),
                        line: row.line,
                    }),
                    _ => doc.malformed.push(malformed(
                        row,
                        "element row needs name, start node, end node and a parameter",
                    )),
                }
            }
            Section::Nodes => {
                let Some(kind) = NodeKind::parse(row.tag()) else {
                    doc.malformed
                        .push(malformed(row, format!("unknown node type '{}'", row.tag())));
                    continue;
                };
                match row.field(1) {
                    Some(name) => doc.nodes.push(NodeRow {
                        kind,
                        name: name.to_string(),
                        line: row.line,
                    }),
                    None => doc.malformed.push(malformed(row, "node row without a name")),
                }
            }
        }
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topology_rows() {
        let doc = parse_topology(
            "run,forward\ntime,10\n\ntype,name,main node,model node\nmoc,arterial,A,A,B,B\n\nlumped,p1,B,n1\n\nnode,A\nnode,B\n",
        );
        assert_eq!(doc.run.get("time").map(String::as_str), Some("10"));
        assert_eq!(doc.networks[0].pairs.len(), 2);
        assert_eq!(doc.couplings[0].model_node, "n1");
        assert_eq!(doc.nodes.len(), 2);
        assert!(doc.malformed.is_empty());
    }

    #[test]
    fn spaces_after_commas_are_trimmed() {
        let doc = parse_circuit(
            "data of edges\ntype, name, node start, node end, initial condition [SI], parameter [SI]\nresistor, R_prox, n1, p_mid, 0.0, 1.2E+09\n\ndata of nodes\ntype, name, initial condition [SI]\nnode, n1, 1.00e+05\nground, g, 1.00e+05\n",
        );
        assert_eq!(doc.edges[0].start, "n1");
        assert_eq!(doc.nodes[1].kind, NodeKind::Ground);
        assert!(doc.malformed.is_empty());
    }

    #[test]
    fn bad_rows_are_collected_not_fatal() {
        let doc = parse_geometry(
            "type,ID\nvis_f,V1,V1,A,B,0.003,0.003,0.0003,0.0003,0.01,5\nvis_f,V2,V2,B\nvis_f,V3,V3,B,C,0.0,0.003,0.0003,0.0003,0.01,5\nwhat,ever\nnode,A,0,,\n",
        );
        assert_eq!(doc.vessels.len(), 1);
        assert_eq!(doc.vessels[0].length, 0.01);
        assert_eq!(doc.malformed.len(), 3);
        assert_eq!(doc.nodes, vec![("A".to_string(), 6)]);
    }

    #[test]
    fn odd_network_pairs_are_malformed() {
        let doc = parse_topology("moc,arterial,A,A,B\n");
        assert!(doc.networks.is_empty());
        assert_eq!(doc.malformed.len(), 1);
    }
}
