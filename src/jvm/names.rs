use crate::jvm::Error;
use std::borrow::Cow;
use std::fmt::{Debug, Display, Error as FmtError, Formatter};

/// Names of annotation elements and enum constants
///
/// See <https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html#jvms-4.2.2>
#[derive(Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct UnqualifiedName(Cow<'static, str>);

/// Names of classes and interfaces, in internal form (`java/lang/annotation/Retention`)
///
/// See <https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html#jvms-4.2.1>
#[derive(Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct BinaryName(Cow<'static, str>);

/// Extracts the raw underlying string name
impl AsRef<str> for UnqualifiedName {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

/// Extracts the raw underlying string name
impl AsRef<str> for BinaryName {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

pub trait Name: Sized {
    /// Check if a string would be a valid name
    fn check_valid(name: impl AsRef<str>) -> Result<(), String>;

    /// Extact the raw underlying string data:
    fn as_cow(&self) -> &Cow<'static, str>;

    /// Extact the raw underlying string name
    fn as_str(&self) -> &str {
        self.as_cow().as_ref()
    }

    /// Try to construct a name from a string
    fn from_string(name: String) -> Result<Self, Error>;
}

impl Name for UnqualifiedName {
    fn check_valid(name: impl AsRef<str>) -> Result<(), String> {
        let name = name.as_ref();
        if name.contains(&['.', ';', '[', '/'][..]) {
            Err(format!(
                "Unqualified name '{}' contains an illegal character",
                name
            ))
        } else if name.is_empty() {
            Err(format!("Unqualified name '{}' is empty", name))
        } else {
            Ok(())
        }
    }

    fn as_cow(&self) -> &Cow<'static, str> {
        &self.0
    }

    fn from_string(name: String) -> Result<Self, Error> {
        match Self::check_valid(&name) {
            Ok(()) => Ok(UnqualifiedName(Cow::Owned(name))),
            Err(msg) => Err(Error::MalformedName(msg)),
        }
    }
}

impl Name for BinaryName {
    fn check_valid(name: impl AsRef<str>) -> Result<(), String> {
        let name = name.as_ref();
        if name.is_empty() {
            Err(format!("Binary name '{}' is empty", name))
        } else {
            name.split('/').map(UnqualifiedName::check_valid).collect()
        }
    }

    fn as_cow(&self) -> &Cow<'static, str> {
        &self.0
    }

    fn from_string(name: String) -> Result<Self, Error> {
        match Self::check_valid(&name) {
            Ok(()) => Ok(BinaryName(Cow::Owned(name))),
            Err(msg) => Err(Error::MalformedName(msg)),
        }
    }
}

impl Debug for UnqualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}
impl Debug for BinaryName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}

impl Display for UnqualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}

impl UnqualifiedName {
    const fn name(value: &'static str) -> UnqualifiedName {
        UnqualifiedName(Cow::Borrowed(value))
    }

    /// Element name used by single-element annotations (`@A(3)`)
    pub const VALUE: Self = Self::name("value");
}

impl BinaryName {
    /// Parse a name written with dots (`java.lang.Object`) into internal form
    pub fn from_source_name(name: &str) -> Result<BinaryName, Error> {
        BinaryName::from_string(name.replace('.', "/"))
    }

    /// Field descriptor of the class type (`Ljava/lang/Object;`)
    pub fn descriptor(&self) -> String {
        format!("L{};", self.as_str())
    }

    /// Inverse of [`BinaryName::descriptor`]
    pub fn from_descriptor(descriptor: &str) -> Result<BinaryName, Error> {
        match descriptor
            .strip_prefix('L')
            .and_then(|rest| rest.strip_suffix(';'))
        {
            Some(internal) => BinaryName::from_string(internal.to_owned()),
            None => Err(Error::MalformedName(format!(
                "'{}' is not a class descriptor",
                descriptor
            ))),
        }
    }

    /// Name as written in source, with dots instead of slashes
    pub fn source_name(&self) -> String {
        self.as_str().replace('/', ".")
    }
}

/// Render a field descriptor the way it is written in source: `Lpkg/A;` becomes `pkg.A`, `[I`
/// becomes `int[]`
///
/// Anything unparseable is returned unchanged.
pub fn descriptor_to_source(descriptor: &str) -> String {
    let dims = descriptor.chars().take_while(|c| *c == '[').count();
    let element = &descriptor[dims..];
    let base = match element {
        "B" => "byte".to_owned(),
        "C" => "char".to_owned(),
        "D" => "double".to_owned(),
        "F" => "float".to_owned(),
        "I" => "int".to_owned(),
        "J" => "long".to_owned(),
        "S" => "short".to_owned(),
        "Z" => "boolean".to_owned(),
        "V" => "void".to_owned(),
        other => match BinaryName::from_descriptor(other) {
            Ok(name) => name.source_name(),
            Err(_) => return descriptor.to_owned(),
        },
    };
    let mut rendered = base;
    for _ in 0..dims {
        rendered.push_str("[]");
    }
    rendered
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn descriptors() -> Result<(), Error> {
        let name = BinaryName::from_source_name("p.Outer$Inner")?;
        assert_eq!(name.descriptor(), "Lp/Outer$Inner;");
        assert_eq!(BinaryName::from_descriptor("Lp/Outer$Inner;")?, name);
        assert!(BinaryName::from_descriptor("p/Outer").is_err());
        Ok(())
    }

    #[test]
    fn invalid_names() {
        assert!(BinaryName::from_string(String::from("a//b")).is_err());
        assert!(UnqualifiedName::from_string(String::from("a.b")).is_err());
        assert!(UnqualifiedName::from_string(String::new()).is_err());
    }

    #[test]
    fn source_rendering() {
        assert_eq!(descriptor_to_source("Ljava/lang/String;"), "java.lang.String");
        assert_eq!(descriptor_to_source("[[I"), "int[][]");
        assert_eq!(descriptor_to_source("V"), "void");
        assert_eq!(descriptor_to_source("Q"), "Q");
    }
}
