use std::io::{self, Write};

use ariadne::{
    Color, ColorGenerator, Config, IndexType, Label, LabelAttach, Report, ReportKind, sources,
};

use crate::source::{FileId, Loc, SourceManager, Span};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagLabel {
    pub file: FileId,
    pub span: Span,
    pub message: String,
}

impl DiagLabel {
    pub fn at(loc: &Loc, message: impl Into<String>) -> Self {
        Self {
            file: loc.file,
            span: loc.span.clone(),
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Diag {
    pub severity: Severity,
    pub message: String,
    pub primary: DiagLabel,
    pub labels: Vec<DiagLabel>,
    pub help: Option<String>,
    pub code: Option<String>,
}

impl Diag {
    pub fn error(file: FileId, span: Span, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, file, span, message)
    }

    pub fn warning(file: FileId, span: Span, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, file, span, message)
    }

    pub fn error_at(loc: &Loc, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, loc.file, loc.span.clone(), message)
    }

    pub fn with_label(mut self, label: DiagLabel) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_note(self, loc: &Loc, message: impl Into<String>) -> Self {
        self.with_label(DiagLabel::at(loc, message))
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    fn new(severity: Severity, file: FileId, span: Span, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            severity,
            primary: DiagLabel {
                file,
                span,
                message: message.clone(),
            },
            message,
            labels: Vec::new(),
            help: None,
            code: None,
        }
    }
}

pub fn has_errors(diags: &[Diag]) -> bool {
    diags.iter().any(|diag| diag.severity == Severity::Error)
}

pub fn warnings(diags: &[Diag]) -> Vec<Diag> {
    diags
        .iter()
        .filter(|diag| diag.severity == Severity::Warning)
        .cloned()
        .collect()
}

pub fn render_diags(source_manager: &SourceManager, diags: &[Diag]) -> io::Result<()> {
    let mut stderr = io::stderr();
    render_diags_to_writer(source_manager, diags, &mut stderr, true)
}

pub fn render_diags_to_string(
    source_manager: &SourceManager,
    diags: &[Diag],
) -> io::Result<String> {
    let mut buffer = Vec::new();
    render_diags_to_writer(source_manager, diags, &mut buffer, false)?;
    String::from_utf8(buffer).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

fn render_diags_to_writer<W: Write>(
    source_manager: &SourceManager,
    diags: &[Diag],
    mut writer: W,
    use_color: bool,
) -> io::Result<()> {
    let mut cache = sources(
        source_manager
            .files_iter()
            .map(|(id, file)| (id.0 as usize, file.text.clone())),
    );

    for diag in diags {
        let mut colors = ColorGenerator::new();
        let primary = (diag.primary.file.0 as usize, diag.primary.span.clone());

        let mut report = Report::build(report_kind(diag.severity), primary.clone())
            .with_message(diag.message.clone())
            .with_config(report_config(diag.severity, use_color))
            .with_label(
                Label::new(primary)
                    .with_message(diag.primary.message.clone())
                    .with_color(primary_color(diag.severity))
                    .with_order(0),
            );

        if let Some(code) = &diag.code {
            report = report.with_code(code.clone());
        }

        // Notes keep their attachment order so multi-site link errors read top to bottom.
        for (idx, label) in diag.labels.iter().enumerate() {
            report = report.with_label(
                Label::new((label.file.0 as usize, label.span.clone()))
                    .with_message(label.message.clone())
                    .with_color(colors.next())
                    .with_order((idx + 1) as i32),
            );
        }

        if let Some(help) = &diag.help {
            report = report.with_help(help.clone());
        }

        report.finish().write(&mut cache, &mut writer)?;
    }

    Ok(())
}

fn report_kind(severity: Severity) -> ReportKind<'static> {
    match severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
    }
}

fn primary_color(severity: Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
    }
}

fn report_config(severity: Severity, use_color: bool) -> Config {
    // Lexer spans are byte offsets, not char offsets.
    let base = Config::default()
        .with_color(use_color)
        .with_index_type(IndexType::Byte)
        .with_label_attach(LabelAttach::Middle)
        .with_cross_gap(true)
        .with_tab_width(4);

    match severity {
        Severity::Error => base,
        Severity::Warning => base.with_compact(true),
    }
}

#[cfg(test)]
mod tests {
    use super::{Diag, Severity, has_errors, render_diags_to_string, warnings};
    use crate::source::{Loc, SourceManager};

    #[test]
    fn renders_primary_message_and_notes() {
        let mut manager = SourceManager::new();
        let file = manager.add_virtual_file("a.om", "module {\n  class @Foo() {}\n}\n");
        let loc = Loc::new(file, 17..21);
        let diag = Diag::error_at(&loc, "class @Foo is broken")
            .with_note(&loc, "class @Foo is defined here")
            .with_code("link::test");

        assert!(has_errors(std::slice::from_ref(&diag)));
        let rendered = render_diags_to_string(&manager, &[diag]).expect("render diagnostics");
        assert!(rendered.contains("class @Foo is broken"), "{rendered}");
        assert!(rendered.contains("class @Foo is defined here"), "{rendered}");
    }

    #[test]
    fn warnings_are_not_errors() {
        let mut manager = SourceManager::new();
        let file = manager.add_virtual_file("a.om", "module {\n  sv.verbatim()\n}\n");
        let diags = vec![
            Diag::warning(file, 11..22, "`sv.verbatim` is dropped"),
            Diag::error(file, 0..6, "broken module"),
        ];

        assert!(!has_errors(&diags[..1]));
        let kept = warnings(&diags);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].severity, Severity::Warning);

        let rendered = render_diags_to_string(&manager, &kept).expect("render diagnostics");
        assert!(rendered.contains("Warning"), "{rendered}");
        assert!(rendered.contains("`sv.verbatim` is dropped"), "{rendered}");
    }
}
