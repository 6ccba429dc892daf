use std::fmt;

/// The builtin primitive type names recognised by the source language.
/// User struct identifiers live alongside these as `SourceType::Named`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum PrimitiveType {
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bool,
    String,
    Char,
    Void,
}

impl PrimitiveType {
    pub fn parse(name: &str) -> Option<PrimitiveType> {
        Some(match name {
            "i8" => PrimitiveType::I8,
            "i16" => PrimitiveType::I16,
            "i32" => PrimitiveType::I32,
            "i64" => PrimitiveType::I64,
            "f32" => PrimitiveType::F32,
            "f64" => PrimitiveType::F64,
            "bool" => PrimitiveType::Bool,
            "string" => PrimitiveType::String,
            "char" => PrimitiveType::Char,
            "void" => PrimitiveType::Void,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::I8 => "i8",
            PrimitiveType::I16 => "i16",
            PrimitiveType::I32 => "i32",
            PrimitiveType::I64 => "i64",
            PrimitiveType::F32 => "f32",
            PrimitiveType::F64 => "f64",
            PrimitiveType::Bool => "bool",
            PrimitiveType::String => "string",
            PrimitiveType::Char => "char",
            PrimitiveType::Void => "void",
        }
    }

    /// Per the §4.8 type mapping table. `string`/`T*` are handled by the
    /// caller since they need the pointee's C name, not just the primitive.
    pub fn c_name(&self) -> &'static str {
        match self {
            PrimitiveType::I8 => "int8_t",
            PrimitiveType::I16 => "int16_t",
            PrimitiveType::I32 => "int32_t",
            PrimitiveType::I64 => "int64_t",
            PrimitiveType::F32 => "float",
            PrimitiveType::F64 => "double",
            PrimitiveType::Bool => "bool",
            PrimitiveType::String => "char*",
            PrimitiveType::Char => "char",
            PrimitiveType::Void => "void",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A resolved source-level type: a base name (builtin or user struct/enum)
/// plus the pointer/optional/array flags from the type annotation slot on
/// an AST node (see §3, "nullable type annotation").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceType {
    pub base: String,
    pub is_pointer: bool,
    pub is_optional: bool,
    pub is_array: bool,
}

impl SourceType {
    pub fn named(base: impl Into<String>) -> Self {
        SourceType {
            base: base.into(),
            is_pointer: false,
            is_optional: false,
            is_array: false,
        }
    }

    pub fn primitive(p: PrimitiveType) -> Self {
        SourceType::named(p.name())
    }

    pub fn pointer_to(mut self) -> Self {
        self.is_pointer = true;
        self
    }

    pub fn optional_of(mut self) -> Self {
        self.is_optional = true;
        self
    }

    pub fn array_of(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn is_auto(&self) -> bool {
        self.base == "auto"
    }

    /// Render this type into the mangling-safe name used to build the
    /// `<base>_<type1>_<type2>...` instantiation key (§4.5). Builtin names
    /// never contain `_`, and struct identifiers are source identifiers
    /// (also `_`-free by convention), so simple concatenation is adequate
    /// here; see DESIGN.md for the known collision caveat from §9.
    pub fn mangle_fragment(&self) -> String {
        let mut out = self.base.clone();
        if self.is_pointer {
            out.push_str("ptr");
        }
        if self.is_optional {
            out.push_str("opt");
        }
        if self.is_array {
            out.push_str("arr");
        }
        out
    }

    /// The §4.8 type mapping, producing the C type spelling for this source
    /// type. `struct_c_name` maps a user struct/enum identifier to its C
    /// name (see the emitter's struct table); builtins ignore it.
    pub fn c_type(&self, struct_c_name: impl Fn(&str) -> String) -> String {
        let base_c = match PrimitiveType::parse(&self.base) {
            Some(p) => p.c_name().to_string(),
            None => struct_c_name(&self.base),
        };

        let mut rendered = if self.is_pointer {
            format!("{} *", base_c.trim_end_matches('*').trim())
        } else {
            base_c
        };

        if self.is_optional {
            rendered = format!("echo_optional_{}", sanitize_for_macro(&rendered));
        }
        if self.is_array {
            rendered.push('*');
        }
        rendered
    }
}

fn sanitize_for_macro(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        if self.is_pointer {
            write!(f, "*")?;
        }
        if self.is_optional {
            write!(f, "?")?;
        }
        if self.is_array {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_c_mapping_matches_table() {
        assert_eq!(PrimitiveType::I32.c_name(), "int32_t");
        assert_eq!(PrimitiveType::F64.c_name(), "double");
        assert_eq!(PrimitiveType::String.c_name(), "char*");
    }

    #[test]
    fn mangle_fragment_is_stable_for_plain_builtins() {
        let t = SourceType::primitive(PrimitiveType::I32);
        assert_eq!(t.mangle_fragment(), "i32");
    }
}
