use crate::graph::{Node, Port};
use crate::types::{PtbType, is_type_compatible};
use ahash::AHashSet;

/// Hands out a command node's io input ports to incoming arguments.
///
/// A port is tried by exact id, then by the id's group prefix, then by the
/// first free port whose type accepts the value, then by the first free
/// port at all.
pub(super) struct PortPicker {
    ports: Vec<Port>,
    taken: AHashSet<String>,
}

impl PortPicker {
    pub(super) fn new(node: &Node) -> Self {
        Self {
            ports: node.ports().into_iter().filter(Port::is_io_in).collect(),
            taken: AHashSet::new(),
        }
    }

    pub(super) fn pick(&mut self, desired: &str, source_type: &PtbType) -> Option<Port> {
        let prefix = group_prefix(desired);
        let free = |p: &&Port| !self.taken.contains(&p.id);
        let port = self
            .ports
            .iter()
            .filter(free)
            .find(|p| p.id == desired)
            .or_else(|| self.ports.iter().filter(free).find(|p| p.id.starts_with(prefix)))
            .or_else(|| {
                self.ports
                    .iter()
                    .filter(free)
                    .find(|p| is_type_compatible(source_type, &p.type_or_unknown()))
            })
            .or_else(|| self.ports.iter().find(free))?
            .clone();
        self.taken.insert(port.id.clone());
        Some(port)
    }
}

/// `in_amount_3` -> `in_amount`. Ids without an index are their own prefix.
fn group_prefix(port_id: &str) -> &str {
    match port_id.rsplit_once('_') {
        Some((prefix, index)) if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) => {
            prefix
        }
        _ => port_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Command, CommandKind};

    #[test]
    fn prefixes() {
        assert_eq!(group_prefix("in_amount_3"), "in_amount");
        assert_eq!(group_prefix("in_coin"), "in_coin");
        assert_eq!(group_prefix("in_elems"), "in_elems");
    }

    #[test]
    fn falls_back_through_prefix_and_type() {
        let node = Node::command("m", Command::new(CommandKind::MergeCoins));
        let mut picker = PortPicker::new(&node);
        let object = PtbType::object();
        assert_eq!(picker.pick("in_source_0", &object).unwrap().id, "in_source_0");
        // Index beyond the sized group: next free port in the same group.
        assert_eq!(picker.pick("in_source_7", &object).unwrap().id, "in_source_1");
        assert_eq!(picker.pick("in_source_8", &object).unwrap().id, "in_destination");
        assert!(picker.pick("in_source_9", &object).is_none());
    }
}
