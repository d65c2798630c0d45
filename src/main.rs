use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use stackvm::bytecode::op::Opcode;
use stackvm::{
    StepOutcome, Stepper, Value, Vm, assemble_source, check_code, disassemble, hex_dump,
};

#[derive(Parser, Debug)]
#[command(name = "stackvm")]
#[command(about = "Assemble and run a stack VM program")]
struct Args {
    /// Assembly source file
    file: PathBuf,

    /// Print the assembled words before running
    #[arg(long = "show-bytecode")]
    show_bytecode: bool,

    /// Print a disassembly listing before running
    #[arg(long)]
    disasm: bool,

    /// Print the final stack
    #[arg(long = "show-stack")]
    show_stack: bool,

    /// Run one opcode at a time, printing the stack after each
    #[arg(long)]
    trace: bool,

    /// Verify stack effects statically before running
    #[arg(long)]
    check: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    let args = Args::parse();

    let source = match fs::read_to_string(&args.file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Failed to read '{}': {}", args.file.display(), e);
            process::exit(1);
        }
    };

    let assembly = assemble_source(&source);
    for diagnostic in &assembly.diagnostics {
        eprintln!("{}: {}", args.file.display(), diagnostic);
    }
    if !assembly.is_clean() {
        eprintln!("{} line(s) failed to assemble", assembly.diagnostics.len());
        process::exit(1);
    }
    let code = assembly.code;

    if args.show_bytecode {
        println!("=== BYTECODE ({} words) ===", code.len());
        print!("{}", hex_dump(&code));
    }

    if args.disasm {
        println!("=== DISASSEMBLY ===");
        match disassemble(&code) {
            Ok(listing) => print!("{}", listing),
            Err(e) => {
                eprintln!("Disassembly error: {}", e);
                process::exit(1);
            }
        }
    }

    if args.check {
        match check_code(&code, 0) {
            Ok(height) => println!("stack check ok: final height {}", height),
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        }
    }

    let result = if args.trace {
        run_traced(&code)
    } else {
        let mut vm = Vm::new();
        let result = vm.execute(&code);
        if args.show_stack {
            print_stack(vm.stack());
        }
        result
    };

    if let Err(e) = result {
        eprintln!("Runtime error: {}", e);
        process::exit(1);
    }
}

fn run_traced(code: &[u32]) -> Result<(), stackvm::ExecError> {
    let mut stepper = Stepper::new();
    stepper.start(code);

    loop {
        let ip = stepper.ip();
        let name = stepper
            .peek()
            .map(|word| match Opcode::try_from(word) {
                Ok(op) => op.mnemonic().to_string(),
                Err(word) => format!("0x{:08x}", word),
            })
            .unwrap_or_else(|| "<end>".to_string());

        let outcome = stepper.step()?;
        println!("{:04}  {:<14} {}", ip, name, format_stack(stepper.stack()));

        if outcome == StepOutcome::Halted {
            return Ok(());
        }
    }
}

fn format_stack(stack: &[Value]) -> String {
    let items: Vec<String> = stack.iter().map(|v| v.to_string()).collect();
    format!("[{}]", items.join(", "))
}

fn print_stack(stack: &[Value]) {
    println!("=== STACK (depth {}) ===", stack.len());
    for (idx, value) in stack.iter().enumerate().rev() {
        println!("{:4}: {} ({})", idx, value, value.type_name());
    }
}
