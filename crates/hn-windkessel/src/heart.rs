//! Default lumped heart driving the network inlet.

use crate::circuit::{CircuitEdge, CircuitNode, LumpedCircuit};

pub const DEFAULT_HEART_ID: &str = "heart_kim_lit";
pub const DEFAULT_HEART_INTERFACE: &str = "aorta";

/// Four-chamber heart with pulmonary loop; the left ventricle ejects into
/// the `aorta` node through the aortic valve diode.
pub fn default_heart() -> LumpedCircuit {
    use crate::circuit::EdgeKind::*;

    let edges = vec![
        // right atrium
        CircuitEdge::new(Voltage, "V_ra", "g", "p_RA1", &[8.0e2]),
        CircuitEdge::new(Inductor, "L_ra", "p_RA1", "p_RA2", &[5.0e4]),
        CircuitEdge::new(Diode, "R_ra", "p_RA2", "p_RA3", &[1.0e6]),
        // right ventricle
        CircuitEdge::new(Elastance, "E_rv", "g2", "p_RA3", &[6.67e7, 8.0e6]),
        CircuitEdge::new(Inductor, "L_rv", "p_RA3", "p_RV1", &[2.5e4]),
        CircuitEdge::new(Diode, "R_rv", "p_RV1", "p_RV2", &[2.0e6]),
        // pulmonary
        CircuitEdge::new(Resistor, "R_pa", "p_RV2", "p_LA1", &[1.2e7]),
        CircuitEdge::new(Capacitor, "C_pa", "g", "p_RV2", &[3.0e-8]),
        // left atrium
        CircuitEdge::new(Capacitor, "E_la", "g3", "p_LA1", &[3.6e-8]),
        CircuitEdge::new(Inductor, "L_la", "p_LA1", "p_LA2", &[1.0e4]),
        CircuitEdge::new(Diode, "R_la", "p_LA2", "p_LA3", &[5.0e5]),
        // left ventricle
        CircuitEdge::new(Elastance, "E_lv", "g1", "p_LA3", &[2.67e8, 8.0e6]),
        CircuitEdge::new(Inductor, "L_lv_aorta", "p_LA3", "p_LV1", &[6.5e4]),
        CircuitEdge::new(Diode, "R_lv_aorta", "p_LV1", DEFAULT_HEART_INTERFACE, &[1.0e6]),
    ];

    let mut nodes = vec![
        CircuitNode::node(DEFAULT_HEART_INTERFACE, 1.13e5),
        CircuitNode::ground("g", 1.0e5),
        CircuitNode::ground("g1", 1.0e5),
        CircuitNode::ground("g2", 1.0e5),
        CircuitNode::ground("g3", 1.0e5),
    ];
    for name in ["p_RA1", "p_RA2", "p_RA3", "p_RV1", "p_RV2"] {
        nodes.push(CircuitNode::node(name, 1.01e5));
    }
    for name in ["p_LA1", "p_LA2", "p_LA3", "p_LV1"] {
        nodes.push(CircuitNode::node(name, 1.011e5));
    }

    LumpedCircuit {
        id: DEFAULT_HEART_ID.to_string(),
        interface: DEFAULT_HEART_INTERFACE.to_string(),
        edges,
        nodes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heart_is_self_consistent() {
        let heart = default_heart();
        assert!(heart.check().is_ok());
        assert_eq!(heart.id, "heart_kim_lit");
        assert!(heart.declares("aorta"));
        assert_eq!(heart.parameter_columns(), 2);
        assert_eq!(heart.nodes.len(), 14);
    }
}
