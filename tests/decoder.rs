//! Tests for rebuilding graphs from transactions.
mod common;
use common::*;
use ptbflow::collab::NoSignatures;
use ptbflow::decoder::{GAS_ID, decode};
use ptbflow::graph::{IoEdge, edge_id};
use ptbflow::prelude::*;
use ptbflow::registry::Command;
use ptbflow::tx::{TxArgument, TxCommand, TxInput, normalize_address};
use ptbflow::types::PtbType;
use serde_json::json;

fn pure_u64(value: u64) -> TxInput {
    TxInput::Pure {
        value_type: Some("u64".into()),
        bytes: value.to_le_bytes().to_vec(),
    }
}

fn command<'g>(graph: &'g Graph, id: &str) -> &'g Command {
    match graph.node(id) {
        Some(Node::Command(node)) => &node.command,
        other => panic!("expected command node {}, found {:?}", id, other),
    }
}

fn io_edge<'g>(
    graph: &'g Graph,
    source: &str,
    sh: &str,
    target: &str,
    th: &str,
) -> Option<&'g IoEdge> {
    let id = edge_id(source, sh, target, th);
    graph.io_edges().find(|e| e.id == id)
}

#[test]
fn test_vector_amount_is_passed_through() {
    let tx = Transaction {
        inputs: vec![TxInput::Pure {
            value_type: Some("vector<u64>".into()),
            bytes: bcs::to_bytes(&vec![1u64, 2u64]).unwrap(),
        }],
        commands: vec![TxCommand::SplitCoins {
            coin: TxArgument::GasCoin,
            amounts: vec![TxArgument::Input { index: 0 }],
        }],
        ..Default::default()
    };

    let decoded = Decoder::new(&tx).decode();
    let graph = &decoded.graph;
    assert_eq!(command(graph, "cmd_0"), &Command::SplitCoins { amounts_count: 1 });
    assert!(io_edge(graph, "input_0", "out", "cmd_0", "in_amount_0").is_some());
    assert!(io_edge(graph, GAS_ID, "out", "cmd_0", "in_coin").is_some());
    assert!(graph.nodes.iter().all(|n| {
        !matches!(n, Node::Command(c) if matches!(c.command, Command::MakeMoveVec { .. }))
    }));
    assert!(
        decoded
            .diagnostics
            .iter()
            .any(|d| d.level == DiagnosticLevel::Info && d.node.as_deref() == Some("cmd_0"))
    );
    assert!(!decoded.has_errors());

    let Some(Node::Variable(input)) = graph.node("input_0") else {
        panic!("input_0 should be a variable");
    };
    assert_eq!(input.var_type, PtbType::vector(PtbType::u64()));
    assert_eq!(input.value, Some(json!(["1", "2"])));
}

#[test]
fn test_nested_results_expand_transfer_group() {
    let nested = |result_index| TxArgument::NestedResult {
        index: 0,
        result_index,
    };
    let tx = Transaction {
        sender: Some(normalize_address(SENDER)),
        inputs: vec![pure_u64(1), pure_u64(2), pure_u64(3), TxInput::Pure {
            value_type: Some("address".into()),
            bytes: vec![7u8; 32],
        }],
        commands: vec![
            TxCommand::SplitCoins {
                coin: TxArgument::GasCoin,
                amounts: (0..3).map(|index| TxArgument::Input { index }).collect(),
            },
            TxCommand::TransferObjects {
                objects: vec![nested(0), nested(1), nested(2)],
                address: TxArgument::Input { index: 3 },
            },
        ],
        ..Default::default()
    };

    let decoded = Decoder::new(&tx).decode();
    let graph = &decoded.graph;
    let transfer = command(graph, "cmd_1");
    assert_eq!(
        transfer,
        &Command::TransferObjects {
            objects_count: 3,
            objects_expanded: true,
        }
    );
    let ports: Vec<_> = transfer.ports().into_iter().map(|p| p.id).collect();
    assert!(ports.contains(&"in_object_2".to_string()));
    assert!(!ports.contains(&"in_objects".to_string()));
    for i in 0..3 {
        let (out, object) = (format!("out_coin_{}", i), format!("in_object_{}", i));
        assert!(io_edge(graph, "cmd_0", &out, "cmd_1", &object).is_some());
    }
    assert!(io_edge(graph, "input_3", "out", "cmd_1", "in_recipient").is_some());
    assert_eq!(decoded.options.sender, tx.sender);

    let flow: Vec<_> = graph.flow_edges().map(|e| (e.source.as_str(), e.target.as_str())).collect();
    assert_eq!(flow, vec![("start", "cmd_0"), ("cmd_0", "cmd_1"), ("cmd_1", "end")]);
    assert!(validate(graph).is_empty());
}

#[test]
fn test_signatures_type_move_call_ports() {
    let program = compile(&swap_graph());
    let tx = build_transaction(&program, &options()).unwrap();

    let typed = decode(&tx, &signatures());
    let Command::MoveCall(call) = command(&typed.graph, "cmd_1") else {
        panic!("cmd_1 should be a moveCall");
    };
    assert_eq!(call.params.len(), 5);
    assert_eq!(call.params[2], PtbType::u64());
    assert_eq!(call.type_params, vec!["T0"]);
    assert_eq!(call.returns, vec![PtbType::object_of("0x2::coin::Coin<T0>")]);
    assert!(
        typed
            .diagnostics
            .iter()
            .all(|d| d.level == DiagnosticLevel::Info)
    );

    let Some(Node::Variable(targ)) = typed.graph.node("cmd_1_targ_0") else {
        panic!("type argument variable missing");
    };
    assert_eq!(targ.value, Some(json!("0x2::sui::SUI")));
    assert!(io_edge(&typed.graph, "cmd_1_targ_0", "out", "cmd_1", "in_targ_0").is_some());

    let untyped = decode(&tx, &NoSignatures);
    let Command::MoveCall(call) = command(&untyped.graph, "cmd_1") else {
        panic!("cmd_1 should be a moveCall");
    };
    assert_eq!(call.params, vec![PtbType::Unknown; 5]);
    assert_eq!(call.returns, vec![PtbType::Unknown]);
    assert!(
        untyped
            .diagnostics
            .iter()
            .any(|d| d.level == DiagnosticLevel::Warn && d.message.contains("no signature"))
    );
}

#[test]
fn test_unsupported_command_is_reported() {
    let tx = Transaction::from_json(
        r#"{
            "inputs": [],
            "commands": [
                {"type": "SplitCoins", "coin": {"type": "GasCoin"}, "amounts": []},
                {"type": "Intent", "name": "coin-with-balance"}
            ]
        }"#,
    )
    .expect("transaction should parse");
    assert_eq!(tx.commands[1], TxCommand::Unsupported);

    let decoded = Decoder::new(&tx).decode();
    assert!(decoded.has_errors());
    assert!(decoded.graph.node("cmd_1").is_none());
    let flow: Vec<_> = decoded
        .graph
        .flow_edges()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();
    assert_eq!(flow, vec![("start", "cmd_0"), ("cmd_0", "end")]);
}

#[test]
fn test_untyped_pure_input_is_kept_as_bytes() {
    let tx = Transaction {
        inputs: vec![TxInput::Pure {
            value_type: None,
            bytes: vec![0xde, 0xad],
        }],
        ..Default::default()
    };
    let decoded = Decoder::new(&tx).decode();
    let Some(Node::Variable(input)) = decoded.graph.node("input_0") else {
        panic!("input_0 should be a variable");
    };
    assert_eq!(input.var_type, PtbType::Unknown);
    assert_eq!(input.value, Some(json!("0xdead")));
    assert_eq!(decoded.diagnostics.len(), 1);
}

#[test]
fn test_decoding_is_deterministic() {
    let program = compile(&swap_graph());
    let tx = build_transaction(&program, &options()).unwrap();
    assert_eq!(decode(&tx, &signatures()), decode(&tx, &signatures()));
}

#[test]
fn test_vector_elements_that_cannot_be_packed_are_an_error() {
    let tx = Transaction {
        inputs: vec![TxInput::Pure {
            value_type: Some("vector<u8>".into()),
            bytes: bcs::to_bytes(&vec![1u8, 2u8]).unwrap(),
        }],
        commands: vec![
            TxCommand::MoveCall {
                package: "0x2".into(),
                module: "bytes".into(),
                function: "fresh".into(),
                type_arguments: vec![],
                arguments: vec![],
            },
            TxCommand::MakeMoveVec {
                type_arg: Some("vector<u8>".into()),
                elements: vec![TxArgument::Input { index: 0 }, TxArgument::Result { index: 0 }],
            },
        ],
        ..Default::default()
    };

    let decoded = decode(&tx, &NoSignatures);
    assert!(decoded.has_errors());
    assert!(decoded.diagnostics.iter().any(|d| {
        d.level == DiagnosticLevel::Error
            && d.node.as_deref() == Some("cmd_1")
            && d.message.contains("only the first is kept")
    }));
    let graph = &decoded.graph;
    assert!(graph.node("cmd_1_elems").is_none());
    assert!(io_edge(graph, "input_0", "out", "cmd_1", "in_elems").is_some());
    assert!(graph.node("input_0").is_some());
}
