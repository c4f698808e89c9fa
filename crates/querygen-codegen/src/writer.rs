//! Code writers.
//!
//! A [`CodeWriter`] is the append-only sink the serializer and the evaluator
//! wrapper synthesis emit into. It owns indentation and knows which packages
//! and classes were imported, so it can render each type reference by its
//! simple name where that is unambiguous and by its qualified name otherwise.

use std::collections::HashSet;
use std::fmt::Write;

use querygen_core::{Annotation, Parameter, Result, Type};

const INDENT: &str = "    ";

/// Append-only, ordered sink for generated source text.
pub trait CodeWriter {
    /// Writes the package declaration of the generated type.
    fn package(&mut self, name: &str) -> Result<()>;

    /// Imports every type of the given packages.
    fn import_packages(&mut self, packages: &[&str]) -> Result<()>;

    /// Imports the given qualified class names.
    fn import_classes(&mut self, classes: &[&str]) -> Result<()>;

    /// Imports the static members of the given qualified class names.
    fn static_imports(&mut self, classes: &[&str]) -> Result<()>;

    fn javadoc(&mut self, lines: &[&str]) -> Result<()>;

    fn annotation(&mut self, annotation: &Annotation) -> Result<()>;

    /// Opens a public class, optionally extending `superclass`.
    fn begin_class(&mut self, ty: &Type, superclass: Option<&Type>) -> Result<()>;

    fn begin_constructor(&mut self, name: &str, params: &[String]) -> Result<()>;

    fn begin_public_method(&mut self, return_type: &str, name: &str, params: &[String])
        -> Result<()>;

    fn begin_static_method(&mut self, return_type: &str, name: &str, params: &[String])
        -> Result<()>;

    /// Writes `public final <ty> <name> = <value>;`.
    fn public_final(&mut self, ty: &str, name: &str, value: &str) -> Result<()>;

    /// Writes `public static final <ty> <name> = <value>;`.
    fn public_static_final(&mut self, ty: &str, name: &str, value: &str) -> Result<()>;

    /// Writes `private static final <ty> <name> = <value>;`.
    fn private_static_final(&mut self, ty: &str, name: &str, value: &str) -> Result<()>;

    /// Writes one indented line.
    fn line(&mut self, text: &str) -> Result<()>;

    /// Writes an empty line.
    fn nl(&mut self) -> Result<()>;

    /// Writes `text` as is, then a line break unless it already ends with one.
    fn verbatim(&mut self, text: &str) -> Result<()>;

    /// Closes the innermost block.
    fn end(&mut self) -> Result<()>;

    /// Renders `ty` without generic parameters.
    fn raw_name(&self, ty: &Type) -> String;

    /// Renders `ty` with its generic parameters.
    fn generic_name(&self, ty: &Type) -> String;
}

/// Writer emitting Java-syntax source into any [`std::fmt::Write`] sink.
#[derive(Debug)]
pub struct JavaWriter<W: Write> {
    out: W,
    indent: usize,
    packages: HashSet<String>,
    classes: HashSet<String>,
}

impl<W: Write> JavaWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            indent: 0,
            packages: HashSet::new(),
            classes: HashSet::new(),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn params(&self, params: &[String]) -> String {
        params.join(", ")
    }

    fn is_visible(&self, ty: &Type) -> bool {
        let package = ty.package_name();
        package.is_empty()
            || package == "java.lang"
            || self.packages.contains(package)
            || self.classes.contains(ty.full_name())
    }
}

impl Default for JavaWriter<String> {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl<W: Write> CodeWriter for JavaWriter<W> {
    fn package(&mut self, name: &str) -> Result<()> {
        if !name.is_empty() {
            writeln!(self.out, "package {name};")?;
            self.nl()?;
        }
        Ok(())
    }

    fn import_packages(&mut self, packages: &[&str]) -> Result<()> {
        for package in packages {
            writeln!(self.out, "import {package}.*;")?;
            self.packages.insert(package.to_string());
        }
        self.nl()
    }

    fn import_classes(&mut self, classes: &[&str]) -> Result<()> {
        for class in classes {
            writeln!(self.out, "import {class};")?;
            self.classes.insert(class.to_string());
        }
        self.nl()
    }

    fn static_imports(&mut self, classes: &[&str]) -> Result<()> {
        for class in classes {
            writeln!(self.out, "import static {class}.*;")?;
        }
        self.nl()
    }

    fn javadoc(&mut self, lines: &[&str]) -> Result<()> {
        self.line("/**")?;
        for line in lines {
            self.line(&format!(" * {line}"))?;
        }
        self.line(" */")
    }

    fn annotation(&mut self, annotation: &Annotation) -> Result<()> {
        let name = self.raw_name(annotation.annotation_type());
        let values: Vec<_> = annotation.values().collect();
        let text = match values.as_slice() {
            [] => format!("@{name}"),
            [("value", value)] => format!("@{name}({value})"),
            _ => {
                let members: Vec<_> = values.iter().map(|(k, v)| format!("{k} = {v}")).collect();
                format!("@{name}({})", members.join(", "))
            }
        };
        self.line(&text)
    }

    fn begin_class(&mut self, ty: &Type, superclass: Option<&Type>) -> Result<()> {
        let mut header = format!("public class {}", ty.simple_name());
        if let Some(superclass) = superclass {
            header.push_str(" extends ");
            header.push_str(&self.generic_name(superclass));
        }
        header.push_str(" {");
        self.line(&header)?;
        self.nl()?;
        self.indent += 1;
        Ok(())
    }

    fn begin_constructor(&mut self, name: &str, params: &[String]) -> Result<()> {
        self.line(&format!("public {name}({}) {{", self.params(params)))?;
        self.indent += 1;
        Ok(())
    }

    fn begin_public_method(
        &mut self,
        return_type: &str,
        name: &str,
        params: &[String],
    ) -> Result<()> {
        self.line(&format!(
            "public {return_type} {name}({}) {{",
            self.params(params)
        ))?;
        self.indent += 1;
        Ok(())
    }

    fn begin_static_method(
        &mut self,
        return_type: &str,
        name: &str,
        params: &[String],
    ) -> Result<()> {
        self.line(&format!(
            "public static {return_type} {name}({}) {{",
            self.params(params)
        ))?;
        self.indent += 1;
        Ok(())
    }

    fn public_final(&mut self, ty: &str, name: &str, value: &str) -> Result<()> {
        self.line(&format!("public final {ty} {name} = {value};"))?;
        self.nl()
    }

    fn public_static_final(&mut self, ty: &str, name: &str, value: &str) -> Result<()> {
        self.line(&format!("public static final {ty} {name} = {value};"))?;
        self.nl()
    }

    fn private_static_final(&mut self, ty: &str, name: &str, value: &str) -> Result<()> {
        self.line(&format!("private static final {ty} {name} = {value};"))?;
        self.nl()
    }

    fn line(&mut self, text: &str) -> Result<()> {
        for _ in 0..self.indent {
            self.out.write_str(INDENT)?;
        }
        writeln!(self.out, "{text}")?;
        Ok(())
    }

    fn nl(&mut self) -> Result<()> {
        self.out.write_char('\n')?;
        Ok(())
    }

    fn verbatim(&mut self, text: &str) -> Result<()> {
        self.out.write_str(text)?;
        if !text.ends_with('\n') {
            self.nl()?;
        }
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.indent = self.indent.saturating_sub(1);
        self.line("}")?;
        self.nl()
    }

    fn raw_name(&self, ty: &Type) -> String {
        if let Some(component) = ty.component_type() {
            return format!("{}[]", self.raw_name(component));
        }
        if ty.is_primitive() || self.is_visible(ty) {
            ty.simple_name().to_string()
        } else {
            ty.full_name().to_string()
        }
    }

    fn generic_name(&self, ty: &Type) -> String {
        let mut name = self.raw_name(ty);
        if !ty.parameters().is_empty() {
            let params: Vec<_> = ty.parameters().iter().map(|p| self.generic_name(p)).collect();
            name.push('<');
            name.push_str(&params.join(", "));
            name.push('>');
        }
        name
    }
}

/// Renders `ty name` for each parameter.
pub fn declare_params(writer: &dyn CodeWriter, params: &[Parameter]) -> Vec<String> {
    params
        .iter()
        .map(|p| format!("{} {}", writer.generic_name(&p.ty), p.name))
        .collect()
}
