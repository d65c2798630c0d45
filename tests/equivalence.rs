//! Streaming vs steppable engine equivalence.
//!
//! Both engines must leave byte-identical stacks (compared through postcard
//! snapshots, so NaN payloads count) and report the same error, if any.

use proptest::prelude::*;
use stackvm::bytecode::codec::{emit_f32, emit_f64, emit_u32, emit_u64};
use stackvm::{ExecError, Opcode, Operand, Stepper, Value, ValueStack, Vm, snapshot};

// ── Test harness ─────────────────────────────────────────────────────────────

struct Outcome {
    result: Result<(), ExecError>,
    stack: Vec<u8>,
}

fn run_streaming(code: &[u32], stack: ValueStack) -> Outcome {
    let mut vm = Vm::new();
    let result = vm.execute_with(code, stack);
    Outcome {
        result,
        stack: snapshot(vm.stack()).expect("snapshot"),
    }
}

fn run_stepped(code: &[u32], stack: ValueStack) -> Outcome {
    let mut stepper = Stepper::new();
    stepper.start_with(code, stack);
    let result = stepper.run();
    Outcome {
        result,
        stack: snapshot(stepper.stack()).expect("snapshot"),
    }
}

fn assert_equivalent(code: &[u32], stack: ValueStack) {
    let a = run_streaming(code, stack.clone());
    let b = run_stepped(code, stack);
    assert_eq!(a.result, b.result, "results diverge for {code:?}");
    assert_eq!(a.stack, b.stack, "stacks diverge for {code:?}");
}

const BOUNDARY_WORDS: [u32; 6] = [
    0,
    u32::MAX, // -1 as i32
    i32::MIN as u32,
    i32::MAX as u32,
    1,
    0x3FC0_0000, // 1.5f32
];

fn boundary_values() -> Vec<Value> {
    vec![
        Value::Int(0),
        Value::Int(-1),
        Value::Int(i32::MIN as i64),
        Value::Int(i32::MAX as i64),
        Value::Int(i64::MIN),
        Value::Uint(u32::MAX as u64),
        Value::Uint(u64::MAX),
        Value::Float(1.5),
        Value::Float(-0.0),
        Value::Float(f64::NAN),
    ]
}

fn emit_operand(out: &mut Vec<u32>, operand: Operand, word: u32) {
    match operand {
        Operand::None => {}
        Operand::I32 | Operand::U32 => emit_u32(out, word),
        Operand::F32 => emit_f32(out, f32::from_bits(word)),
        Operand::I64 => emit_u64(out, word as i32 as i64 as u64),
        Operand::U64 => emit_u64(out, word as u64),
        Operand::F64 => emit_f64(out, f32::from_bits(word) as f64),
    }
}

// ── Fixed corpus ─────────────────────────────────────────────────────────────

#[test]
fn every_opcode_with_boundary_operands() {
    for op in Opcode::ALL {
        for word in BOUNDARY_WORDS {
            let mut code = vec![op as u32];
            emit_operand(&mut code, op.operand(), word);

            for value in boundary_values() {
                assert_equivalent(&code, ValueStack::with_frame(vec![value; 3], 0).unwrap());
                assert_equivalent(&code, ValueStack::with_frame(vec![value; 3], 2).unwrap());
            }
            assert_equivalent(&code, ValueStack::new());
        }
    }
}

#[test]
fn truncated_operands() {
    for op in Opcode::ALL {
        let width = op.width();
        if width == 1 {
            continue;
        }
        let mut code = vec![op as u32];
        code.extend(std::iter::repeat_n(7, width - 2));
        assert_equivalent(&code, ValueStack::with_frame(vec![Value::Int(1)], 0).unwrap());
    }
}

#[test]
fn assembled_program() {
    let source = "\
        PushI32 -2147483647
        PushU32 0xFFFFFFFF
        PushF64 1.5
        PushI64 -1
        Copy 0
        Swap 1
        AddInt
        MulConstF32 0.5
        Negative
        Increment
        DivConstU64 3
        SubConstI32 -1
        PopN 1
        Halt
        Pop
    ";
    let asm = stackvm::assemble_source(source);
    assert!(asm.is_clean(), "{:?}", asm.diagnostics);
    assert_equivalent(&asm.code, ValueStack::new());
}

// ── Properties ───────────────────────────────────────────────────────────────

fn operand_word() -> impl Strategy<Value = u32> {
    prop_oneof![
        prop::sample::select(BOUNDARY_WORDS.to_vec()),
        0u32..8,
        any::<u32>(),
    ]
}

fn instruction() -> impl Strategy<Value = Vec<u32>> {
    prop_oneof![
        8 => (prop::sample::select(Opcode::ALL.to_vec()), operand_word()).prop_map(|(op, word)| {
            let mut out = vec![op as u32];
            emit_operand(&mut out, op.operand(), word);
            out
        }),
        1 => any::<u32>().prop_map(|word| vec![word]),
    ]
}

fn program() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::vec(instruction(), 0..40).prop_map(|parts| parts.concat())
}

fn initial_stack() -> impl Strategy<Value = ValueStack> {
    let value = prop_oneof![
        any::<i64>().prop_map(Value::Int),
        any::<u64>().prop_map(Value::Uint),
        any::<f64>().prop_map(Value::Float),
        prop::sample::select(boundary_values()),
    ];
    proptest::collection::vec(value, 0..8).prop_flat_map(|values| {
        let len = values.len();
        (Just(values), 0..=len).prop_map(|(values, base)| {
            ValueStack::with_frame(values, base).expect("base within length")
        })
    })
}

proptest! {
    #[test]
    fn prop_engines_agree(code in program(), stack in initial_stack()) {
        let a = run_streaming(&code, stack.clone());
        let b = run_stepped(&code, stack);
        prop_assert_eq!(a.result, b.result);
        prop_assert_eq!(a.stack, b.stack);
    }

    #[test]
    fn prop_engines_agree_on_raw_words(code in proptest::collection::vec(any::<u32>(), 0..32)) {
        let a = run_streaming(&code, ValueStack::new());
        let b = run_stepped(&code, ValueStack::new());
        prop_assert_eq!(a.result, b.result);
        prop_assert_eq!(a.stack, b.stack);
    }

    #[test]
    fn prop_stepper_halts_or_faults_for_good(code in program()) {
        let mut stepper = Stepper::new();
        stepper.start(&code);
        let first = stepper.run();
        let again = stepper.step();
        match first {
            Ok(()) => prop_assert_eq!(again, Ok(stackvm::StepOutcome::Halted)),
            Err(e) => prop_assert_eq!(again, Err(e)),
        }
    }
}
