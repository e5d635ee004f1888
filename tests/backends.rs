//! Tests for the two lowering backends and the trace they share.
mod common;
use common::*;
use ptbflow::backend::TraceArg;
use ptbflow::ir::{POp, PValue};
use ptbflow::prelude::*;
use ptbflow::registry::{Command, CommandKind, FunctionSignature, MoveCallParams};
use ptbflow::tx::{TxArgument, TxCommand, TxInput, normalize_address};
use ptbflow::types::PtbType;
use serde_json::json;

#[test]
fn test_split_transfer_transaction() {
    let program = compile(&split_transfer_graph());
    let tx = build_transaction(&program, &options()).expect("Failed to build transaction");

    assert_eq!(tx.sender.as_deref(), Some(normalize_address(SENDER).as_str()));
    assert_eq!(tx.gas_budget, Some(10_000_000));
    assert_eq!(
        tx.inputs[0],
        TxInput::Object {
            object_id: normalize_address("0xc0")
        }
    );
    assert_eq!(
        tx.inputs[1],
        TxInput::Pure {
            value_type: Some("u64".into()),
            bytes: 500000000u64.to_le_bytes().to_vec(),
        }
    );
    assert_eq!(
        tx.commands,
        vec![
            TxCommand::SplitCoins {
                coin: TxArgument::Input { index: 0 },
                amounts: vec![TxArgument::Input { index: 1 }],
            },
            TxCommand::TransferObjects {
                objects: vec![TxArgument::NestedResult {
                    index: 0,
                    result_index: 0
                }],
                address: TxArgument::Input { index: 2 },
            },
        ]
    );
}

#[test]
fn test_backends_issue_identical_traces() {
    for graph in [split_transfer_graph(), swap_graph()] {
        let program = compile(&graph);
        let tx = build_transaction(&program, &options()).unwrap();
        let source = emit_source(&program, &options()).unwrap();
        assert_eq!(tx.call_trace(), source.trace);
    }
}

#[test]
fn test_swap_trace_contents() {
    let program = compile(&swap_graph());
    let trace = build_transaction(&program, &options()).unwrap().call_trace();

    assert_eq!(trace.len(), 3);
    assert_eq!(trace[0].args[0], TraceArg::Gas);
    assert_eq!(
        trace[0].args[1],
        TraceArg::Pure {
            value_type: Some("u64".into()),
            value: json!("1000"),
        }
    );

    let swap = &trace[1];
    assert_eq!(swap.kind, CommandKind::MoveCall);
    assert_eq!(
        swap.target.as_deref(),
        Some(format!("{}::pool::swap", normalize_address(POOL_PACKAGE)).as_str())
    );
    assert_eq!(swap.type_args, vec!["0x2::sui::SUI"]);
    assert_eq!(
        swap.args,
        vec![
            TraceArg::Object {
                id: normalize_address("0xabc")
            },
            TraceArg::NestedResult {
                index: 0,
                result: 0
            },
            TraceArg::Pure {
                value_type: Some("u64".into()),
                value: json!("5"),
            },
            TraceArg::Pure {
                value_type: Some("bool".into()),
                value: json!(true),
            },
            TraceArg::Object {
                id: normalize_address("0x6")
            },
        ]
    );
    assert_eq!(
        trace[2].args[0],
        TraceArg::NestedResult {
            index: 1,
            result: 0
        }
    );
}

#[test]
fn test_executable_requires_sender_for_wallet_address() {
    let program = compile(&split_transfer_graph());
    let result = build_transaction(&program, &ExecOptions::new());
    assert_eq!(result, Err(LowerError::MissingSender));

    // A program that never touches the wallet builds without one.
    let program = compile(&swap_graph());
    let tx = build_transaction(&program, &ExecOptions::new()).unwrap();
    assert!(tx.sender.is_none());
}

#[test]
fn test_emitter_declares_wallet_placeholder() {
    let program = compile(&split_transfer_graph());
    let source = emit_source(&program, &ExecOptions::new()).unwrap();

    assert!(source.code.contains("declare const myAddress: string;"));
    assert!(source.code.contains("tx.transferObjects([coin], tx.pure.address(myAddress));"));
    assert!(!source.code.contains("setSender"));
    assert_eq!(
        source.trace[1].args[1],
        TraceArg::Pure {
            value_type: Some("address".into()),
            value: json!("myAddress"),
        }
    );
}

#[test]
fn test_emitted_statements() {
    let program = compile(&split_transfer_graph());
    let source = emit_source(&program, &options()).unwrap();
    let code = &source.code;

    assert!(code.starts_with("import { Transaction } from '@mysten/sui/transactions';\n"));
    assert!(code.contains("const tx = new Transaction();"));
    assert!(code.contains(&format!("tx.setSender('{}');", normalize_address(SENDER))));
    assert!(code.contains("tx.setGasBudget(10000000);"));
    assert!(code.contains("const myCoin = tx.object('0xc0');"));
    assert!(code.contains("const amount = tx.pure.u64(500000000n);"));
    assert!(code.contains("const [coin] = tx.splitCoins(myCoin, [amount]);"));
    assert!(code.trim_end().ends_with("export default tx;"));
    assert!(!code.contains("myAddress"));
}

#[test]
fn test_emitted_move_call() {
    let program = compile(&swap_graph());
    let source = emit_source(&program, &options()).unwrap();
    assert!(source.code.contains(&format!(
        "const [swap_result] = tx.moveCall({{ target: '{}::pool::swap', typeArguments: ['0x2::sui::SUI'], arguments: [pool, coin, minOut, exact, tx.object.clock()] }});",
        POOL_PACKAGE
    )));
    assert!(source.code.contains("tx.splitCoins(tx.gas, [amount])"));
}

#[test]
fn test_undefined_operand_names_the_slot() {
    let mut graph = split_transfer_graph();
    graph.remove_node("amount");
    let program = compile(&graph);

    let expected = LowerError::UndefinedOperand {
        op: 0,
        kind: CommandKind::SplitCoins,
        slot: "amount_0".into(),
    };
    assert_eq!(build_transaction(&program, &options()), Err(expected.clone()));
    assert_eq!(emit_source(&program, &options()), Err(expected));
}

#[test]
fn test_invalid_sender_is_rejected() {
    let program = compile(&swap_graph());
    let options = ExecOptions::new().with_sender("not-an-address");
    assert!(matches!(
        build_transaction(&program, &options),
        Err(LowerError::InvalidSender(_))
    ));
    assert!(matches!(
        emit_source(&program, &options),
        Err(LowerError::InvalidSender(_))
    ));
}

#[test]
fn test_shared_variable_is_encoded_once_per_op() {
    let mut graph = empty_graph();
    graph.add_node(Node::variable("amt", "amount", PtbType::number(), Some(json!(7))));
    graph.add_node(Node::command("split", Command::SplitCoins { amounts_count: 2 }));
    graph.add_node(Node::variable("gas", "gas", PtbType::object(), None));
    chain(&mut graph, &["start", "split", "end"]);
    wire(&mut graph, "gas", "out", "split", "in_coin");
    wire(&mut graph, "amt", "out", "split", "in_amount_0");
    wire(&mut graph, "amt", "out", "split", "in_amount_1");

    let program = compile(&graph);
    let tx = build_transaction(&program, &ExecOptions::new()).unwrap();
    assert_eq!(tx.inputs.len(), 1);
    assert_eq!(
        tx.commands[0],
        TxCommand::SplitCoins {
            coin: TxArgument::GasCoin,
            amounts: vec![TxArgument::Input { index: 0 }, TxArgument::Input { index: 0 }],
        }
    );
}

#[test]
fn test_vector_group_spreads_into_elements() {
    let mut graph = empty_graph();
    graph.add_node(Node::variable(
        "coins",
        "coin",
        PtbType::vector(PtbType::object()),
        Some(json!(["0xa", "0xb"])),
    ));
    graph.add_node(Node::variable("to", "recipient", PtbType::address(), Some(json!("0x7"))));
    graph.add_node(Node::command(
        "send",
        Command::TransferObjects {
            objects_count: 1,
            objects_expanded: false,
        },
    ));
    chain(&mut graph, &["start", "send", "end"]);
    wire(&mut graph, "coins", "out", "send", "in_objects");
    wire(&mut graph, "to", "out", "send", "in_recipient");

    let program = compile(&graph);
    assert!(matches!(program.ops[0], POp::TransferObjects { .. }));
    assert_eq!(program.ops[0].operands()[0], &PValue::symbol("coins"));

    let tx = build_transaction(&program, &ExecOptions::new()).unwrap();
    assert_eq!(
        tx.commands,
        vec![TxCommand::TransferObjects {
            objects: vec![TxArgument::Input { index: 0 }, TxArgument::Input { index: 1 }],
            address: TxArgument::Input { index: 2 },
        }]
    );
    let source = emit_source(&program, &ExecOptions::new()).unwrap();
    assert_eq!(tx.call_trace(), source.trace);
}

#[test]
fn test_handle_list_argument_is_packed_into_a_vector() {
    let join = MoveCallParams::new("0x2", "pay", "join_vec").with_signature(&FunctionSignature {
        type_params: 1,
        inputs: vec![
            "&mut 0x2::coin::Coin<T0>".into(),
            "vector<0x2::coin::Coin<T0>>".into(),
        ],
        outputs: vec![],
    });

    let mut graph = empty_graph();
    graph.add_node(Node::variable(
        "t",
        "coinType",
        PtbType::string(),
        Some(json!("0x2::sui::SUI")),
    ));
    graph.add_node(Node::variable("dest", "primary", PtbType::object(), Some(json!("0xd"))));
    graph.add_node(Node::variable(
        "coins",
        "coin",
        PtbType::vector(PtbType::object()),
        Some(json!(["0xa", "0xb"])),
    ));
    graph.add_node(Node::command("join", Command::MoveCall(join)));
    chain(&mut graph, &["start", "join", "end"]);
    wire(&mut graph, "t", "out", "join", "in_targ_0");
    wire(&mut graph, "dest", "out", "join", "in_arg_0");
    wire(&mut graph, "coins", "out", "join", "in_arg_1");

    let program = compile(&graph);
    let tx = build_transaction(&program, &ExecOptions::new()).unwrap();
    assert_eq!(tx.inputs.len(), 3);
    assert_eq!(
        tx.commands[0],
        TxCommand::MakeMoveVec {
            type_arg: None,
            elements: vec![TxArgument::Input { index: 1 }, TxArgument::Input { index: 2 }],
        }
    );
    assert_eq!(
        tx.commands[1],
        TxCommand::MoveCall {
            package: "0x2".into(),
            module: "pay".into(),
            function: "join_vec".into(),
            type_arguments: vec!["0x2::sui::SUI".into()],
            arguments: vec![TxArgument::Input { index: 0 }, TxArgument::Result { index: 0 }],
        }
    );

    let source = emit_source(&program, &ExecOptions::new()).unwrap();
    assert_eq!(tx.call_trace(), source.trace);
    assert!(source.code.contains(
        "const items = tx.makeMoveVec({ elements: [tx.object('0xa'), tx.object('0xb')] });"
    ));
}

#[test]
fn test_emitted_type_arguments_cannot_escape_their_literal() {
    let call = MoveCallParams::new("0x2", "m", "f").with_signature(&FunctionSignature {
        type_params: 1,
        inputs: vec![],
        outputs: vec![],
    });
    let hostile = "0x2::sui::SUI']; alert(1); ['";

    let mut graph = empty_graph();
    graph.add_node(Node::variable(
        "t",
        "coinType",
        PtbType::string(),
        Some(json!(hostile)),
    ));
    graph.add_node(Node::command("call", Command::MoveCall(call)));
    chain(&mut graph, &["start", "call", "end"]);
    wire(&mut graph, "t", "out", "call", "in_targ_0");

    let program = compile(&graph);
    let source = emit_source(&program, &ExecOptions::new()).unwrap();
    assert!(source.code.contains(
        r"tx.moveCall({ target: '0x2::m::f', typeArguments: ['0x2::sui::SUI\']; alert(1); [\''], arguments: [] });"
    ));
    assert!(!source.code.contains("SUI']"));

    // Both backends still agree on the type argument itself.
    let tx = build_transaction(&program, &ExecOptions::new()).unwrap();
    assert_eq!(tx.call_trace(), source.trace);
    assert_eq!(source.trace[0].type_args, vec![hostile.to_string()]);
}
