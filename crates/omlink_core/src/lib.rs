use std::path::{Path, PathBuf};

pub mod diag;
pub mod fmt;
pub mod ir;
pub mod lex;
pub mod link;
mod parallel;
pub mod parse;
pub mod source;
pub mod types;
pub mod walk;

use diag::{Diag, has_errors, render_diags, warnings};
use fmt::format_module;
use ir::{Entry, Module};
use link::link_modules;
use parse::parse_file;
use source::{FileId, SourceManager};

pub use diag::{DiagLabel, Severity as DiagSeverity};
pub use link::{LinkError, LinkOptions, Mismatch, SymbolKind};

#[derive(Clone, Debug, Default)]
pub struct PipelineWarnings {
    pub diags: Vec<Diag>,
}

#[derive(Clone, Debug)]
pub struct LinkOutput {
    pub module: Module,
    pub text: String,
    pub warnings: PipelineWarnings,
}

// Diagnostics are rendered to stderr; nothing is written to `out` unless linking succeeds.
pub fn link_paths(
    inputs: &[PathBuf],
    out: Option<&Path>,
    opts: &LinkOptions,
) -> Result<LinkOutput, Vec<Diag>> {
    let artifacts = link_inputs(inputs, opts);
    let _ = render_diags(&artifacts.source_manager, &artifacts.diags);

    let Some(module) = artifacts.module else {
        return Err(artifacts.diags);
    };
    let text = format_module(&module);

    if let Some(out) = out {
        if let Err(err) = std::fs::write(out, &text) {
            let mut source_manager = artifacts.source_manager;
            let file = source_manager.add_virtual_file(out.to_path_buf(), String::new());
            let io_diag = Diag::error(file, 0..0, format!("failed to write output file: {err}"));
            let mut diags = artifacts.diags;
            diags.push(io_diag);
            let _ = render_diags(&source_manager, &diags);
            return Err(diags);
        }
    }

    Ok(LinkOutput {
        module,
        text,
        warnings: PipelineWarnings {
            diags: warnings(&artifacts.diags),
        },
    })
}

pub fn check_paths(inputs: &[PathBuf], opts: &LinkOptions) -> Result<PipelineWarnings, Vec<Diag>> {
    let artifacts = link_inputs(inputs, opts);
    let _ = render_diags(&artifacts.source_manager, &artifacts.diags);

    if artifacts.module.is_none() || has_errors(&artifacts.diags) {
        Err(artifacts.diags)
    } else {
        Ok(PipelineWarnings {
            diags: warnings(&artifacts.diags),
        })
    }
}

pub fn format_path(input: &Path) -> Result<String, Vec<Diag>> {
    let mut source_manager = SourceManager::new();
    let file = match load_input(&mut source_manager, input) {
        Ok(file) => file,
        Err(diags) => {
            let _ = render_diags(&source_manager, &diags);
            return Err(diags);
        }
    };

    let (modules, diags) = parse_file(&source_manager, file);
    let _ = render_diags(&source_manager, &diags);
    if has_errors(&diags) {
        return Err(diags);
    }

    Ok(fmt::format_modules(&modules))
}

// Each text becomes its own virtual file; diagnostics are returned, not rendered.
pub fn link_source_texts(texts: &[&str], opts: &LinkOptions) -> (Option<Module>, Vec<Diag>) {
    let mut source_manager = SourceManager::new();
    let mut modules = Vec::new();
    let mut diags = Vec::new();

    for (idx, text) in texts.iter().enumerate() {
        let file = source_manager.add_virtual_file(format!("input{idx}.om"), text.to_string());
        let (parsed, parse_diags) = parse_file(&source_manager, file);
        modules.extend(parsed);
        diags.extend(parse_diags);
    }

    let module = link_parsed(modules, opts, &mut diags);
    (module, diags)
}

struct LinkArtifacts {
    source_manager: SourceManager,
    module: Option<Module>,
    diags: Vec<Diag>,
}

fn link_inputs(inputs: &[PathBuf], opts: &LinkOptions) -> LinkArtifacts {
    let mut source_manager = SourceManager::new();
    let mut modules = Vec::new();
    let mut diags = Vec::new();

    for input in inputs {
        match load_input(&mut source_manager, input) {
            Ok(file) => {
                let (parsed, parse_diags) = parse_file(&source_manager, file);
                modules.extend(parsed);
                diags.extend(parse_diags);
            }
            Err(load_diags) => diags.extend(load_diags),
        }
    }

    let module = link_parsed(modules, opts, &mut diags);
    LinkArtifacts {
        source_manager,
        module,
        diags,
    }
}

fn link_parsed(modules: Vec<Module>, opts: &LinkOptions, diags: &mut Vec<Diag>) -> Option<Module> {
    if has_errors(diags) {
        return None;
    }
    diags.extend(modules.iter().flat_map(dropped_entry_warnings));

    match link_modules(modules, opts) {
        Ok(module) => Some(module),
        Err(err) => {
            diags.push(Diag::from(&err));
            None
        }
    }
}

fn dropped_entry_warnings(module: &Module) -> impl Iterator<Item = Diag> + '_ {
    module.entries.iter().filter_map(|entry| match entry {
        Entry::Other(op) => Some(
            Diag::warning(
                op.loc.file,
                op.loc.span.clone(),
                format!("`{}` is neither a class nor an hw.module and is dropped", op.name),
            )
            .with_code("link::dropped-entry"),
        ),
        Entry::Class(_) | Entry::HwModule(_) => None,
    })
}

fn load_input(source_manager: &mut SourceManager, input: &Path) -> Result<FileId, Vec<Diag>> {
    source_manager.load_path(input).map_err(|err| {
        let file = source_manager.add_virtual_file(input.to_path_buf(), String::new());
        vec![Diag::error(
            file,
            0..0,
            format!("failed to read input file: {err}"),
        )]
    })
}
