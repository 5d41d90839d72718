use pretty::{Arena, DocAllocator, DocBuilder};

use crate::{
    diag::{Diag, has_errors},
    ir::{
        ClassDef, ClassExtern, Entry, HwModuleDef, HwModuleExtern, Module, Op, Param, Port,
        Symbol, Visibility,
    },
    parse::parse_source,
    source::SourceManager,
};

const FORMAT_WIDTH: usize = 100;
const BLOCK_INDENT: isize = 2;
const CONTINUATION_INDENT: isize = 4;

type Doc<'a> = DocBuilder<'a, Arena<'a>>;

pub fn format_module(module: &Module) -> String {
    format_modules(std::slice::from_ref(module))
}

pub fn format_modules(modules: &[Module]) -> String {
    let arena = Arena::new();
    let docs: Vec<_> = modules.iter().map(|module| doc_module(&arena, module)).collect();

    let body = if docs.is_empty() {
        arena.nil()
    } else {
        arena.intersperse(docs, arena.hardline().append(arena.hardline()))
    };
    let doc = body.append(arena.hardline());

    render_doc(doc)
}

pub fn format_source(src: &str, filename: &str) -> Result<String, Vec<Diag>> {
    let mut source_manager = SourceManager::new();
    let (modules, diags) = parse_source(&mut source_manager, filename, src);

    if has_errors(&diags) {
        return Err(diags);
    }

    Ok(format_modules(&modules))
}

fn render_doc(doc: Doc<'_>) -> String {
    let mut out = Vec::new();
    doc.render(FORMAT_WIDTH, &mut out)
        .expect("writing to Vec<u8> cannot fail");
    String::from_utf8(out).expect("formatter produced invalid UTF-8")
}

fn block<'a>(arena: &'a Arena<'a>, lines: Vec<Doc<'a>>) -> Doc<'a> {
    if lines.is_empty() {
        return arena.text("{}");
    }

    arena
        .text("{")
        .append(
            arena
                .hardline()
                .append(arena.intersperse(lines, arena.hardline()))
                .nest(BLOCK_INDENT),
        )
        .append(arena.hardline())
        .append(arena.text("}"))
}

fn comma_list<'a>(
    arena: &'a Arena<'a>,
    open: &'static str,
    items: Vec<Doc<'a>>,
    close: &'static str,
) -> Doc<'a> {
    arena
        .text(open)
        .append(
            arena
                .intersperse(items, arena.text(",").append(arena.line()))
                .nest(CONTINUATION_INDENT),
        )
        .append(arena.text(close))
        .group()
}

fn doc_module<'a>(arena: &'a Arena<'a>, module: &Module) -> Doc<'a> {
    let head = match &module.namespace {
        Some(namespace) => arena.text(format!("module @{namespace} ")),
        None => arena.text("module "),
    };
    let entries = module
        .entries
        .iter()
        .map(|entry| doc_entry(arena, entry))
        .collect();

    head.append(block(arena, entries))
}

fn doc_entry<'a>(arena: &'a Arena<'a>, entry: &Entry) -> Doc<'a> {
    match entry {
        Entry::Class(Symbol::Definition(class)) => doc_class(arena, class),
        Entry::Class(Symbol::Extern(class)) => doc_class_extern(arena, class),
        Entry::HwModule(Symbol::Definition(module)) => doc_hw_module(arena, module),
        Entry::HwModule(Symbol::Extern(module)) => doc_hw_module_extern(arena, module),
        Entry::Other(op) => doc_op(arena, op),
    }
}

fn doc_params<'a>(arena: &'a Arena<'a>, params: &[Param]) -> Doc<'a> {
    let items = params
        .iter()
        .map(|param| arena.text(format!("%{}: {}", param.name, param.ty)))
        .collect();
    comma_list(arena, "(", items, ")")
}

fn doc_ports<'a>(arena: &'a Arena<'a>, ports: &[Port]) -> Doc<'a> {
    let items = ports.iter().map(|port| arena.as_string(port)).collect();
    comma_list(arena, "(", items, ")")
}

fn doc_visibility<'a>(arena: &'a Arena<'a>, visibility: Visibility) -> Doc<'a> {
    match visibility {
        Visibility::Public => arena.nil(),
        Visibility::Private => arena.text("private "),
    }
}

fn doc_class<'a>(arena: &'a Arena<'a>, class: &ClassDef) -> Doc<'a> {
    let mut lines: Vec<_> = class.body.iter().map(|op| doc_op(arena, op)).collect();
    lines.extend(class.fields.iter().map(|field| {
        arena.text(format!(
            "field @{}: {} = %{}",
            field.name, field.ty, field.value
        ))
    }));

    arena
        .text(format!("class @{}", class.name))
        .append(doc_params(arena, &class.params))
        .append(arena.space())
        .append(block(arena, lines))
}

fn doc_class_extern<'a>(arena: &'a Arena<'a>, class: &ClassExtern) -> Doc<'a> {
    let lines = class
        .fields
        .iter()
        .map(|field| arena.text(format!("field @{}: {}", field.name, field.ty)))
        .collect();

    arena
        .text(format!("extern class @{}", class.name))
        .append(doc_params(arena, &class.params))
        .append(arena.space())
        .append(block(arena, lines))
}

fn doc_hw_module<'a>(arena: &'a Arena<'a>, module: &HwModuleDef) -> Doc<'a> {
    let body = module.body.iter().map(|op| doc_op(arena, op)).collect();

    arena
        .text("hw.module ")
        .append(doc_visibility(arena, module.visibility))
        .append(arena.text(format!("@{}", module.name)))
        .append(doc_ports(arena, &module.ports))
        .append(arena.space())
        .append(block(arena, body))
}

fn doc_hw_module_extern<'a>(arena: &'a Arena<'a>, module: &HwModuleExtern) -> Doc<'a> {
    arena
        .text("hw.module.extern ")
        .append(doc_visibility(arena, module.visibility))
        .append(arena.text(format!("@{}", module.name)))
        .append(doc_ports(arena, &module.ports))
}

fn doc_op<'a>(arena: &'a Arena<'a>, op: &Op) -> Doc<'a> {
    let mut doc = match &op.result {
        Some(result) => arena.text(format!("%{result} = {}", op.name)),
        None => arena.text(op.name.clone()),
    };

    let operands = op
        .operands
        .iter()
        .map(|operand| arena.text(format!("%{operand}")))
        .collect();
    doc = doc.append(comma_list(arena, "(", operands, ")"));

    if !op.attrs.is_empty() {
        let attrs = op.attrs.iter().map(|attr| arena.as_string(attr)).collect();
        doc = doc
            .append(arena.space())
            .append(comma_list(arena, "[", attrs, "]"));
    }

    if let Some(ty) = &op.result_type {
        doc = doc.append(arena.text(format!(" : {ty}")));
    }

    for region in &op.regions {
        let ops = region.iter().map(|op| doc_op(arena, op)).collect();
        doc = doc.append(arena.space()).append(block(arena, ops));
    }

    doc
}

#[cfg(test)]
mod tests {
    use super::{format_modules, format_source};
    use crate::{
        ir::{Entry, HwModuleExtern, Module, Port, PortDirection, Symbol, Visibility},
        source::Loc,
        types::Type,
    };

    #[test]
    fn prints_canonical_layout() {
        let src = "module @a{class @Foo(%w:i8){%0=om.object(%w)[class=@Bar]:class<@Bar>\nfield @bar:class<@Bar>=%0}\nhw.module.extern private @Sub(in a:i1)}module{}";
        let formatted = format_source(src, "a.om").expect("source should parse");

        assert_eq!(
            formatted,
            "module @a {\n  class @Foo(%w: i8) {\n    %0 = om.object(%w) [class = @Bar] : class<@Bar>\n    field @bar: class<@Bar> = %0\n  }\n  hw.module.extern private @Sub(in a: i1)\n}\n\nmodule {}\n"
        );
    }

    #[test]
    fn formatting_is_idempotent() {
        let src = r#"module {
  hw.module @Top(in clk: i1, out q: i8) {
    sv.ifdef() [cond = {flag = true, sizes = [1, -2]}] {
      %x = hw.constant() [value = 3] : i4
    } {}
  }
}
"#;
        let once = format_source(src, "a.om").expect("source should parse");
        let twice = format_source(&once, "b.om").expect("formatted text should parse");
        assert_eq!(once, src);
        assert_eq!(twice, once);
    }

    #[test]
    fn empty_module_list_prints_a_newline() {
        assert_eq!(format_modules(&[]), "\n");

        let module = Module {
            namespace: None,
            entries: vec![Entry::HwModule(Symbol::Extern(HwModuleExtern {
                name: "X".into(),
                loc: Loc::default(),
                visibility: Visibility::Public,
                ports: vec![Port::new("o", PortDirection::InOut, Type::int(2))],
            }))],
        };
        assert_eq!(
            format_modules(&[module]),
            "module {\n  hw.module.extern @X(inout o: i2)\n}\n"
        );
    }
}
