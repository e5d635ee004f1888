//! Common test utilities for building graphs, signatures and transactions.
use ptbflow::collab::SignatureSnapshot;
use ptbflow::prelude::*;
use ptbflow::registry::{
    Command, CommandKind, FunctionSignature, MoveCallParams, PackageSignatures, PublishParams,
    UpgradeParams,
};
use ptbflow::types::PtbType;
use serde_json::json;

pub const SENDER: &str = "0x42";
pub const POOL_PACKAGE: &str = "0x2f";

/// Start and End joined by nothing yet.
#[allow(dead_code)]
pub fn empty_graph() -> Graph {
    let mut graph = Graph::new();
    graph.add_node(Node::start("start"));
    graph.add_node(Node::end("end"));
    graph
}

/// Connects `ids` into a single flow chain.
#[allow(dead_code)]
pub fn chain(graph: &mut Graph, ids: &[&str]) {
    for pair in ids.windows(2) {
        graph
            .connect_flow(pair[0], pair[1])
            .expect("flow edge should connect");
    }
}

#[allow(dead_code)]
pub fn wire(
    graph: &mut Graph,
    source: &str,
    source_handle: &str,
    target: &str,
    target_handle: &str,
) {
    graph
        .connect_io(source, source_handle, target, target_handle)
        .unwrap_or_else(|e| {
            panic!(
                "{}:{} -> {}:{} rejected: {}",
                source, source_handle, target, target_handle, e
            )
        });
}

/// Splits 500000000 off an owned coin and sends it to the wallet.
///
/// Start -> split -> transfer -> End
#[allow(dead_code)]
pub fn split_transfer_graph() -> Graph {
    let mut graph = empty_graph();
    graph.add_node(Node::variable("coin", "myCoin", PtbType::object(), Some(json!("0xc0"))));
    graph.add_node(Node::variable(
        "amount",
        "amount",
        PtbType::number(),
        Some(json!(500000000)),
    ));
    graph.add_node(Node::variable("me", "myAddress", PtbType::address(), None));
    graph.add_node(Node::command("split", Command::SplitCoins { amounts_count: 1 }));
    graph.add_node(Node::command("transfer", Command::new(CommandKind::TransferObjects)));

    chain(&mut graph, &["start", "split", "transfer", "end"]);
    wire(&mut graph, "coin", "out", "split", "in_coin");
    wire(&mut graph, "amount", "out", "split", "in_amount_0");
    wire(&mut graph, "split", "out_coin_0", "transfer", "in_object_0");
    wire(&mut graph, "me", "out", "transfer", "in_recipient");
    graph
}

#[allow(dead_code)]
pub fn swap_signature() -> FunctionSignature {
    FunctionSignature {
        type_params: 1,
        inputs: vec![
            format!("&mut {}::pool::Pool<T0>", POOL_PACKAGE),
            "0x2::coin::Coin<T0>".to_string(),
            "u64".to_string(),
            "bool".to_string(),
            "&0x2::clock::Clock".to_string(),
            "&mut 0x2::tx_context::TxContext".to_string(),
        ],
        outputs: vec!["0x2::coin::Coin<T0>".to_string()],
    }
}

#[allow(dead_code)]
pub fn record_signature() -> FunctionSignature {
    FunctionSignature {
        type_params: 0,
        inputs: vec!["vector<u64>".to_string(), "vector<address>".to_string()],
        outputs: vec![],
    }
}

#[allow(dead_code)]
pub fn authorize_signature() -> FunctionSignature {
    FunctionSignature {
        type_params: 0,
        inputs: vec![
            "&mut 0x2::package::UpgradeCap".to_string(),
            "u8".to_string(),
            "vector<u8>".to_string(),
        ],
        outputs: vec!["0x2::package::UpgradeTicket".to_string()],
    }
}

#[allow(dead_code)]
pub fn commit_signature() -> FunctionSignature {
    FunctionSignature {
        type_params: 0,
        inputs: vec![
            "&mut 0x2::package::UpgradeCap".to_string(),
            "0x2::package::UpgradeReceipt".to_string(),
        ],
        outputs: vec![],
    }
}

#[allow(dead_code)]
pub fn signatures() -> SignatureSnapshot {
    let mut pool = PackageSignatures::default();
    pool.insert("pool", "swap", swap_signature());
    pool.insert("batch", "record", record_signature());
    let mut framework = PackageSignatures::default();
    framework.insert("package", "authorize_upgrade", authorize_signature());
    framework.insert("package", "commit_upgrade", commit_signature());
    SignatureSnapshot::new()
        .with_package(POOL_PACKAGE, pool)
        .with_package("0x2", framework)
}

/// Splits gas, swaps the split coin through a pool and sends the proceeds to
/// a fixed address.
///
/// Start -> split -> swap -> transfer -> End
#[allow(dead_code)]
pub fn swap_graph() -> Graph {
    let mut graph = empty_graph();
    graph.add_node(Node::variable("gas", "gas", PtbType::object(), None));
    graph.add_node(Node::variable("amount", "amount", PtbType::number(), Some(json!("1000"))));
    graph.add_node(Node::variable("pool", "pool", PtbType::object(), Some(json!("0xabc"))));
    graph.add_node(Node::variable(
        "coin_type",
        "coinType",
        PtbType::string(),
        Some(json!("0x2::sui::SUI")),
    ));
    graph.add_node(Node::variable("min", "minOut", PtbType::number(), Some(json!(5))));
    graph.add_node(Node::variable("flag", "exact", PtbType::bool(), Some(json!(true))));
    graph.add_node(Node::variable("clock", "clock", PtbType::object(), Some(json!("0x6"))));
    graph.add_node(Node::variable("to", "recipient", PtbType::address(), Some(json!("0x42"))));

    let swap = MoveCallParams::new(POOL_PACKAGE, "pool", "swap").with_signature(&swap_signature());
    graph.add_node(Node::command("split", Command::SplitCoins { amounts_count: 1 }));
    graph.add_node(Node::command("swap", Command::MoveCall(swap)));
    graph.add_node(Node::command("transfer", Command::new(CommandKind::TransferObjects)));

    chain(&mut graph, &["start", "split", "swap", "transfer", "end"]);
    wire(&mut graph, "gas", "out", "split", "in_coin");
    wire(&mut graph, "amount", "out", "split", "in_amount_0");
    wire(&mut graph, "coin_type", "out", "swap", "in_targ_0");
    wire(&mut graph, "pool", "out", "swap", "in_arg_0");
    wire(&mut graph, "split", "out_coin_0", "swap", "in_arg_1");
    wire(&mut graph, "min", "out", "swap", "in_arg_2");
    wire(&mut graph, "flag", "out", "swap", "in_arg_3");
    wire(&mut graph, "clock", "out", "swap", "in_arg_4");
    wire(&mut graph, "swap", "out_ret_0", "transfer", "in_object_0");
    wire(&mut graph, "to", "out", "transfer", "in_recipient");
    graph
}

/// Splits gas twice, merges both parts into an owned coin, packs two
/// amounts and records them together with a list of addresses.
///
/// Start -> split -> merge -> pack -> record -> End
#[allow(dead_code)]
pub fn batch_graph() -> Graph {
    let mut graph = empty_graph();
    graph.add_node(Node::variable("gas", "gas", PtbType::object(), None));
    graph.add_node(Node::variable("a", "first", PtbType::number(), Some(json!(10))));
    graph.add_node(Node::variable("b", "second", PtbType::number(), Some(json!(20))));
    graph.add_node(Node::variable("dest", "primary", PtbType::object(), Some(json!("0xc1"))));
    graph.add_node(Node::variable("x", "low", PtbType::u64(), Some(json!("7"))));
    graph.add_node(Node::variable("y", "high", PtbType::u64(), Some(json!("9"))));
    graph.add_node(Node::variable(
        "owners",
        "owners",
        PtbType::vector(PtbType::address()),
        Some(json!(["0x1", "0x2"])),
    ));

    let record =
        MoveCallParams::new(POOL_PACKAGE, "batch", "record").with_signature(&record_signature());
    graph.add_node(Node::command("split", Command::SplitCoins { amounts_count: 2 }));
    graph.add_node(Node::command(
        "merge",
        Command::MergeCoins {
            sources_count: 2,
            sources_expanded: true,
        },
    ));
    graph.add_node(Node::command(
        "pack",
        Command::MakeMoveVec {
            elem_type: PtbType::u64(),
            elems_count: 2,
            elems_expanded: true,
        },
    ));
    graph.add_node(Node::command("record", Command::MoveCall(record)));

    chain(&mut graph, &["start", "split", "merge", "pack", "record", "end"]);
    wire(&mut graph, "gas", "out", "split", "in_coin");
    wire(&mut graph, "a", "out", "split", "in_amount_0");
    wire(&mut graph, "b", "out", "split", "in_amount_1");
    wire(&mut graph, "dest", "out", "merge", "in_destination");
    wire(&mut graph, "split", "out_coin_0", "merge", "in_source_0");
    wire(&mut graph, "split", "out_coin_1", "merge", "in_source_1");
    wire(&mut graph, "x", "out", "pack", "in_elem_0");
    wire(&mut graph, "y", "out", "pack", "in_elem_1");
    wire(&mut graph, "pack", "out_vector", "record", "in_arg_0");
    wire(&mut graph, "owners", "out", "record", "in_arg_1");
    graph
}

/// Packs a list of byte strings into one `vector<vector<u8>>`.
///
/// Start -> pack -> End
#[allow(dead_code)]
pub fn blobs_graph() -> Graph {
    let mut graph = empty_graph();
    graph.add_node(Node::variable(
        "blobs",
        "blobs",
        PtbType::parse_move("vector<vector<u8>>"),
        Some(json!([[1, 2], [3]])),
    ));
    graph.add_node(Node::command(
        "pack",
        Command::MakeMoveVec {
            elem_type: PtbType::parse_move("vector<u8>"),
            elems_count: 2,
            elems_expanded: false,
        },
    ));
    chain(&mut graph, &["start", "pack", "end"]);
    wire(&mut graph, "blobs", "out", "pack", "in_elems");
    graph
}

/// Publishes a package, upgrades another one and sends the new cap home.
///
/// Start -> publish -> authorize -> upgrade -> commit -> transfer -> End
#[allow(dead_code)]
pub fn upgrade_graph() -> Graph {
    let mut graph = empty_graph();
    graph.add_node(Node::variable("cap", "upgradeCap", PtbType::object(), Some(json!("0xca"))));
    graph.add_node(Node::variable("policy", "policy", PtbType::parse_move("u8"), Some(json!(0))));
    graph.add_node(Node::variable(
        "digest",
        "digest",
        PtbType::parse_move("vector<u8>"),
        Some(json!([1, 2, 3])),
    ));
    graph.add_node(Node::variable("me", "myAddress", PtbType::address(), None));

    let modules = vec!["AQID".to_string()];
    let dependencies = vec!["0x1".to_string(), "0x2".to_string()];
    graph.add_node(Node::command(
        "publish",
        Command::Publish(PublishParams {
            modules: modules.clone(),
            dependencies: dependencies.clone(),
        }),
    ));
    let authorize = MoveCallParams::new("0x2", "package", "authorize_upgrade")
        .with_signature(&authorize_signature());
    graph.add_node(Node::command("authorize", Command::MoveCall(authorize)));
    graph.add_node(Node::command(
        "upgrade",
        Command::Upgrade(UpgradeParams {
            modules,
            dependencies,
            package: "0xbeef".to_string(),
        }),
    ));
    let commit = MoveCallParams::new("0x2", "package", "commit_upgrade")
        .with_signature(&commit_signature());
    graph.add_node(Node::command("commit", Command::MoveCall(commit)));
    graph.add_node(Node::command("transfer", Command::new(CommandKind::TransferObjects)));

    chain(
        &mut graph,
        &["start", "publish", "authorize", "upgrade", "commit", "transfer", "end"],
    );
    wire(&mut graph, "cap", "out", "authorize", "in_arg_0");
    wire(&mut graph, "policy", "out", "authorize", "in_arg_1");
    wire(&mut graph, "digest", "out", "authorize", "in_arg_2");
    wire(&mut graph, "authorize", "out_ret_0", "upgrade", "in_ticket");
    wire(&mut graph, "cap", "out", "commit", "in_arg_0");
    wire(&mut graph, "upgrade", "out_receipt", "commit", "in_arg_1");
    wire(&mut graph, "publish", "out_upgrade_cap", "transfer", "in_object_0");
    wire(&mut graph, "me", "out", "transfer", "in_recipient");
    graph
}

/// Every fixture graph that lowers with [`options`].
#[allow(dead_code)]
pub fn all_graphs() -> Vec<Graph> {
    vec![
        split_transfer_graph(),
        swap_graph(),
        batch_graph(),
        blobs_graph(),
        upgrade_graph(),
    ]
}

#[allow(dead_code)]
pub fn options() -> ExecOptions {
    ExecOptions::new().with_sender(SENDER).with_gas_budget(10_000_000)
}

#[allow(dead_code)]
pub fn compile(graph: &Graph) -> Program {
    Compiler::builder(graph)
        .build()
        .compile()
        .expect("Failed to compile")
}
