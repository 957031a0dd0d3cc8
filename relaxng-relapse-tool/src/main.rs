use relapse_interp::Interpreter;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::process::exit;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
enum Cli {
    /// Translate a simplified RELAX NG schema and print the Relapse grammar
    Translate { schema: PathBuf },
    /// Validate XML documents against a simplified RELAX NG schema
    Validate { schema: PathBuf, xml: Vec<PathBuf> },
}

fn main() {
    match Cli::from_args() {
        Cli::Translate { schema } => translate(schema),
        Cli::Validate { schema, xml } => validate(schema, xml),
    }
}

fn translate(schema: PathBuf) {
    let grammar = load_grammar(&schema);
    print!("{}", grammar);
}

fn validate(schema: PathBuf, xmls: Vec<PathBuf>) {
    let grammar = load_grammar(&schema);
    let interp = match Interpreter::new(grammar) {
        Ok(interp) => interp,
        Err(err) => {
            eprintln!("{}: {}", schema.display(), err);
            exit(1);
        }
    };
    let mut rejected = false;
    for xml in xmls {
        let doc = read_file(&xml);
        match interp.validate(&doc) {
            Ok(true) => eprintln!("{}: valid", xml.display()),
            Ok(false) => {
                eprintln!("{}: not valid", xml.display());
                rejected = true;
            }
            Err(err) => {
                eprintln!("{}: {}", xml.display(), err);
                rejected = true;
            }
        }
    }
    if rejected {
        exit(2);
    }
}

fn load_grammar(schema: &PathBuf) -> relapse_syntax::Grammar {
    let source = read_file(schema);
    let mut grammar = match relaxng_simplified::xml::parse(&source) {
        Ok(grammar) => grammar,
        Err(err) => {
            dump_diagnostic(schema, source, &err);
            exit(1);
        }
    };
    relaxng_simplified::remove_todos(&mut grammar);
    match relaxng_relapse::translate(&grammar) {
        Ok(relapse) => relapse,
        Err(err) => {
            eprintln!("{}: {}", schema.display(), err);
            exit(1);
        }
    }
}

fn read_file(path: &PathBuf) -> String {
    let mut f = match File::open(path) {
        Ok(f) => f,
        Err(err) => {
            eprintln!("{}: {}", path.display(), err);
            exit(1);
        }
    };
    let mut source = String::new();
    if let Err(err) = f.read_to_string(&mut source) {
        eprintln!("{}: {}", path.display(), err);
        exit(1);
    }
    source
}

fn dump_diagnostic(path: &PathBuf, source: String, err: &relaxng_simplified::xml::Error) {
    let mut map = codemap::CodeMap::new();
    let len = source.len() as u64;
    let file = map.add_file(path.to_string_lossy().to_string(), source);
    let span = err.span();
    let start = (span.start as u64).min(len);
    let end = (span.end as u64).clamp(start, len);
    let label = codemap_diagnostic::SpanLabel {
        span: file.span.subspan(start, end),
        style: codemap_diagnostic::SpanStyle::Primary,
        label: None,
    };
    let d = codemap_diagnostic::Diagnostic {
        level: codemap_diagnostic::Level::Error,
        message: err.to_string(),
        code: None,
        spans: vec![label],
    };
    let mut emitter = codemap_diagnostic::Emitter::stderr(
        codemap_diagnostic::ColorConfig::Auto,
        Some(&map),
    );
    emitter.emit(&[d]);
}
