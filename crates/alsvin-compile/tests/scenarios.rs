//! End-to-end scenarios through parse → passes → emit.

use std::sync::Arc;

use alsvin_compile::passes::{
    ApplyLayout, Desugar, FoldRotations, Inline, ResynthesizeCnots, Simplify, SteinerMap, SwapMap,
    estimate,
};
use alsvin_compile::{
    Diagnostics, LayoutAlgorithm, MappingStrategy, Pass, SemanticCheck, standard_pipeline,
};
use alsvin_device::Device;
use alsvin_ir::{Gate, Program, StmtKind};
use alsvin_qasm::{emit, parse};

fn run_pass(pass: &dyn Pass, prog: &mut Program) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let mut diags = Diagnostics::new();
    pass.run(prog, &mut diags)
        .unwrap_or_else(|e| panic!("{} failed: {e}\n{diags:?}", pass.name()));
}

fn gate_lines(printed: &str) -> Vec<String> {
    printed
        .lines()
        .map(str::trim)
        .filter(|l| {
            !l.is_empty()
                && !l.starts_with("OPENQASM")
                && !l.starts_with("include")
                && !l.starts_with("qreg")
                && !l.starts_with("creg")
        })
        .map(ToString::to_string)
        .collect()
}

fn semantic_ok(prog: &Program) -> bool {
    let mut diags = Diagnostics::new();
    alsvin_compile::semantic::check(prog, &mut diags).is_ok()
}

/// Every CNOT-like two-qubit gate must sit on a device coupling.
fn assert_device_correct(prog: &Program, device: &Device) {
    for stmt in &prog.stmts {
        if let StmtKind::Gate(Gate::Call { name, qargs, .. }) = &stmt.kind {
            if name == "cx" {
                let c = qargs[0].offset.unwrap() as usize;
                let t = qargs[1].offset.unwrap() as usize;
                assert!(
                    device.coupled(c, t),
                    "cx q[{c}],q[{t}] is not a device coupling"
                );
            }
        }
    }
}

#[test]
fn t_pair_merges_to_s() {
    let mut prog = parse(
        "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\nt q[0];\nt q[0];\n",
    )
    .unwrap();
    run_pass(&FoldRotations, &mut prog);

    assert_eq!(gate_lines(&emit(&prog)), vec!["s q[0];"]);
}

#[test]
fn t_tdg_pair_cancels() {
    let mut prog = parse(
        "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\nt q[0];\ntdg q[0];\n",
    )
    .unwrap();
    run_pass(&FoldRotations, &mut prog);

    assert!(gate_lines(&emit(&prog)).is_empty());
}

#[test]
fn sandwiched_t_gates_merge_across_x() {
    let mut prog = parse(
        "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\n\
         h q[0];\nt q[0];\nh q[0];\nx q[0];\nh q[0];\nt q[0];\nh q[0];\n",
    )
    .unwrap();
    run_pass(&FoldRotations, &mut prog);
    run_pass(&Simplify, &mut prog);

    assert_eq!(
        gate_lines(&emit(&prog)),
        vec!["x q[0];", "h q[0];", "s q[0];", "h q[0];"]
    );
}

#[test]
fn resynthesis_merges_t_through_cnot() {
    let mut prog = parse(
        "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\n\
         cx q[1],q[0];\nt q[0];\nt q[0];\n",
    )
    .unwrap();
    run_pass(&ResynthesizeCnots, &mut prog);

    assert_eq!(
        gate_lines(&emit(&prog)),
        vec!["cx q[1],q[0];", "s q[0];"]
    );
}

#[test]
fn swap_routing_on_linear_device() {
    // CX q[0],q[2] on a 3-qubit line routes through the middle qubit: a
    // SWAP decomposed into three CNOTs plus the terminal-edge CNOT, all on
    // device couplings.
    let device = Arc::new(Device::line(3));
    let mut prog = parse(
        "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[3];\nCX q[0],q[2];\n",
    )
    .unwrap();
    run_pass(
        &ApplyLayout::new(Arc::clone(&device), LayoutAlgorithm::Linear),
        &mut prog,
    );
    run_pass(&SwapMap::new(Arc::clone(&device)), &mut prog);

    assert_eq!(
        gate_lines(&emit(&prog)),
        vec![
            "cx q[0],q[1];",
            "cx q[1],q[0];",
            "cx q[0],q[1];",
            "cx q[1],q[2];",
        ]
    );
    assert_device_correct(&prog, &device);
}

#[test]
fn routing_permutation_tracks_swaps() {
    // The emitted SWAPs realise the tracked permutation. After
    // routing, the walking qubit ends one step from its origin, and a
    // trailing measure must follow it.
    let device = Arc::new(Device::line(3));
    let mut prog = parse(
        "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[3];\ncreg c[3];\n\
         CX q[0],q[2];\nmeasure q[0] -> c[0];\nmeasure q[1] -> c[1];\n",
    )
    .unwrap();
    run_pass(
        &ApplyLayout::new(Arc::clone(&device), LayoutAlgorithm::Linear),
        &mut prog,
    );
    run_pass(&SwapMap::new(Arc::clone(&device)), &mut prog);

    let printed = emit(&prog);
    // SWAP(0,1) moved the virtual qubit 0 to physical 1 and vice versa.
    assert!(printed.contains("measure q[1] -> c[0];"));
    assert!(printed.contains("measure q[0] -> c[1];"));
}

#[test]
fn steiner_mapping_realises_cnot_ladder() {
    let device = Arc::new(Device::square_9q());
    let mut prog = parse(
        "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[9];\n\
         cx q[0],q[2];\ncx q[0],q[6];\n",
    )
    .unwrap();
    run_pass(
        &ApplyLayout::new(Arc::clone(&device), LayoutAlgorithm::Linear),
        &mut prog,
    );
    run_pass(&SteinerMap::new(Arc::clone(&device)), &mut prog);

    assert_device_correct(&prog, &device);

    // Replay over GF(2): the mapped circuit must realise exactly the two
    // input CNOTs with no stray rotations.
    let mut rows: Vec<Vec<bool>> = (0..9).map(|i| (0..9).map(|j| i == j).collect()).collect();
    for line in gate_lines(&emit(&prog)) {
        assert!(line.starts_with("cx "), "unexpected gate: {line}");
        let args: Vec<usize> = line
            .trim_start_matches("cx q[")
            .trim_end_matches("];")
            .split("],q[")
            .map(|v| v.parse().unwrap())
            .collect();
        let (c, t) = (args[0], args[1]);
        let src = rows[c].clone();
        for (dst, s) in rows[t].iter_mut().zip(src) {
            *dst ^= s;
        }
    }
    let mut expected: Vec<Vec<bool>> =
        (0..9).map(|i| (0..9).map(|j| i == j).collect()).collect();
    for (c, t) in [(0, 2), (0, 6)] {
        let src = expected[c].clone();
        for (dst, s) in expected[t].iter_mut().zip(src) {
            *dst ^= s;
        }
    }
    assert_eq!(rows, expected);
}

#[test]
fn broadcast_desugars_elementwise() {
    let mut prog = parse(
        "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\nqreg p[2];\nCX q,p;\n",
    )
    .unwrap();
    run_pass(&Desugar, &mut prog);

    assert_eq!(
        gate_lines(&emit(&prog)),
        vec!["CX q[0],p[0];", "CX q[1],p[1];"]
    );
}

#[test]
fn uniform_length_mismatch_is_rejected() {
    let prog = parse(
        "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\nqreg p[2];\nCX q,p;\n",
    )
    .unwrap();
    let mut diags = Diagnostics::new();
    assert!(alsvin_compile::semantic::check(&prog, &mut diags).is_err());
    assert!(diags.has_errors());
}

// ---------------------------------------------------------------------------
// Invariants
// ---------------------------------------------------------------------------

const SAMPLE: &str = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\n\
    gate majority a,b,c { cx c,b; cx c,a; ccx a,b,c; }\n\
    qreg q[4];\ncreg c[4];\n\
    h q[0];\nt q[0];\ncx q[0],q[1];\ntdg q[1];\nt q[1];\n\
    majority q[0],q[1],q[2];\ncx q[2],q[3];\nh q[3];\n\
    measure q[3] -> c[3];\nif (c==1) x q[0];\n";

/// Every pass output is still accepted by the semantic analyzer.
#[test]
fn passes_preserve_semantics() {
    let passes: Vec<Box<dyn Pass>> = vec![
        Box::new(Desugar),
        Box::new(Inline::clean()),
        Box::new(Simplify),
        Box::new(FoldRotations),
        Box::new(ResynthesizeCnots),
    ];

    let mut prog = parse(SAMPLE).unwrap();
    assert!(semantic_ok(&prog));
    for pass in &passes {
        run_pass(pass.as_ref(), &mut prog);
        assert!(
            semantic_ok(&prog),
            "{} broke semantic validity:\n{}",
            pass.name(),
            emit(&prog)
        );
    }
}

/// The fully mapped pipeline output still type-checks and fits the device.
#[test]
fn mapped_pipeline_preserves_semantics() {
    for strategy in [MappingStrategy::Swap, MappingStrategy::Steiner] {
        let device = Arc::new(Device::grid(3, 3));
        let manager = standard_pipeline(Some(device.clone()), LayoutAlgorithm::Linear, strategy);
        let mut prog = parse(SAMPLE).unwrap();
        let mut diags = Diagnostics::new();
        manager
            .run(&mut prog, &mut diags)
            .unwrap_or_else(|e| panic!("pipeline ({strategy:?}) failed: {e}\n{diags:?}"));
        assert!(semantic_ok(&prog));
        assert_device_correct(&prog, &device);
    }
}

/// Rotation folding never increases gate or T counts.
#[test]
fn folding_is_monotone() {
    let sources = [
        "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\n\
         t q[0];\nh q[1];\ncx q[0],q[1];\nt q[1];\ntdg q[0];\nh q[0];\nt q[0];\n",
        "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\n\
         t q[0];\ns q[0];\nt q[0];\nx q[0];\nt q[0];\n",
    ];

    for source in sources {
        let mut prog = parse(source).unwrap();
        let before = estimate(&prog);
        run_pass(&FoldRotations, &mut prog);
        let after = estimate(&prog);

        assert!(after.total() <= before.total());
        let t_before = before.count("t") + before.count("tdg");
        let t_after = after.count("t") + after.count("tdg");
        assert!(t_after <= t_before);
    }
}

/// CNOT resynthesis does not increase the CNOT count of cnot-dihedral
/// programs.
#[test]
fn resynthesis_bounds_cnot_count() {
    let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[3];\n\
                  cx q[0],q[1];\nt q[1];\ncx q[0],q[1];\ncx q[1],q[2];\n\
                  tdg q[2];\ncx q[1],q[2];\ncx q[0],q[1];\ncx q[0],q[1];\n";
    let mut prog = parse(source).unwrap();
    let before = estimate(&prog).count("cx");
    run_pass(&ResynthesizeCnots, &mut prog);
    let after = estimate(&prog).count("cx");
    assert!(after <= before, "cx count grew from {before} to {after}");
}

/// Passes are idempotent: re-running one changes nothing.
#[test]
fn passes_are_idempotent() {
    let passes: Vec<Box<dyn Pass>> = vec![
        Box::new(Desugar),
        Box::new(Simplify),
        Box::new(FoldRotations),
        Box::new(ResynthesizeCnots),
    ];

    for pass in &passes {
        let mut prog = parse(SAMPLE).unwrap();
        run_pass(&Inline::clean(), &mut prog);
        run_pass(pass.as_ref(), &mut prog);
        let once = emit(&prog);
        run_pass(pass.as_ref(), &mut prog);
        assert_eq!(emit(&prog), once, "{} is not idempotent", pass.name());
    }
}

/// A freshly-emitted program re-emits to the same text.
#[test]
fn emission_is_stable() {
    let mut prog = parse(SAMPLE).unwrap();
    run_pass(&SemanticCheck, &mut prog);
    let once = emit(&prog);
    let twice = emit(&parse(&once).unwrap());
    assert_eq!(once, twice);
}

/// The adder circuit end to end: optimize then map both ways.
#[test]
fn end_to_end_adder() {
    let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\n\
        qreg a[2];\nqreg b[2];\ncreg c[2];\n\
        x a[0];\nx b[0];\n\
        cx a[0],b[0];\ncx a[1],b[1];\nt b[0];\ntdg b[0];\n\
        h b[1];\ncx b[0],b[1];\nh b[1];\n\
        measure b[0] -> c[0];\nmeasure b[1] -> c[1];\n";

    for strategy in [MappingStrategy::Swap, MappingStrategy::Steiner] {
        let device = Arc::new(Device::line(5));
        let manager = standard_pipeline(Some(device.clone()), LayoutAlgorithm::Linear, strategy);
        let mut prog = parse(source).unwrap();
        let mut diags = Diagnostics::new();
        manager
            .run(&mut prog, &mut diags)
            .unwrap_or_else(|e| panic!("pipeline ({strategy:?}) failed: {e}\n{diags:?}"));

        assert_device_correct(&prog, &device);
        let printed = emit(&prog);
        assert!(printed.contains("measure"));
        // The t·tdg pair folded away.
        assert_eq!(estimate(&prog).count("t"), 0);
        assert_eq!(estimate(&prog).count("tdg"), 0);
    }
}
