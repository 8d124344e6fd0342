//! System font discovery via fontdb.

use super::program::TrueTypeProgram;
use crate::KernelError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

/// Key for the program cache.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct ProgramCacheKey {
    family: String,
    weight: u16,
    italic: bool,
}

/// Resolves a family name plus weight/style to a parsed font program.
///
/// Programs are cached, so repeated lookups for the same face share one
/// parsed program.
pub struct SystemFontProvider {
    db: fontdb::Database,
    cache: RefCell<HashMap<ProgramCacheKey, Rc<TrueTypeProgram>>>,
}

impl Default for SystemFontProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemFontProvider {
    /// An empty provider; add fonts with [`Self::load_font_data`] or
    /// [`Self::load_system_fonts`].
    pub fn new() -> Self {
        Self { db: fontdb::Database::new(), cache: RefCell::new(HashMap::new()) }
    }

    pub fn with_system_fonts() -> Self {
        let mut provider = Self::new();
        provider.load_system_fonts();
        provider
    }

    pub fn load_system_fonts(&mut self) {
        self.db.load_system_fonts();
        log::debug!("Loaded {} system font faces", self.db.len());
    }

    pub fn load_font_data(&mut self, data: Vec<u8>) {
        log::debug!("load_font_data called with {} bytes", data.len());
        self.db.load_font_data(data);
    }

    pub fn load_fonts_dir<P: AsRef<std::path::Path>>(&mut self, path: P) {
        self.db.load_fonts_dir(path);
    }

    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    /// Best match for `family`, falling back to any sans-serif face.
    pub fn resolve(
        &self,
        family: &str,
        weight: u16,
        italic: bool,
    ) -> Result<Rc<TrueTypeProgram>, KernelError> {
        let key = ProgramCacheKey { family: family.to_lowercase(), weight, italic };
        if let Some(program) = self.cache.borrow().get(&key) {
            return Ok(program.clone());
        }

        let style = if italic { fontdb::Style::Italic } else { fontdb::Style::Normal };
        let query = fontdb::Query {
            families: &[fontdb::Family::Name(family), fontdb::Family::SansSerif],
            weight: fontdb::Weight(weight),
            stretch: fontdb::Stretch::Normal,
            style,
        };
        let id = self.db.query(&query).ok_or_else(|| {
            log::warn!("Font not found: {} {} {}", family, weight, if italic { "italic" } else { "" });
            KernelError::FontProgram(format!("No font found for family '{}'", family))
        })?;

        let data = self
            .db
            .with_face_data(id, |data, _index| data.to_vec())
            .ok_or_else(|| KernelError::FontProgram(format!("Cannot read font data for '{}'", family)))?;
        let program = Rc::new(TrueTypeProgram::from_shared(Arc::new(data))?);
        log::debug!("Resolved '{}' to '{}'", family, program_name(&program));
        self.cache.borrow_mut().insert(key, program.clone());
        Ok(program)
    }
}

fn program_name(program: &TrueTypeProgram) -> &str {
    use super::FontProgram;
    &program.names().font_name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{build_test_font, TestFontOptions};

    #[test]
    fn resolves_loaded_font_data_and_caches_it() {
        let mut provider = SystemFontProvider::new();
        provider.load_font_data(build_test_font(&[('a', 500)], TestFontOptions::default()));
        assert_eq!(provider.face_count(), 1);

        let first = provider.resolve("VellumTest", 400, false).unwrap();
        let second = provider.resolve("vellumtest", 400, false).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn empty_database_reports_missing_font() {
        let provider = SystemFontProvider::new();
        assert!(matches!(
            provider.resolve("Nope", 400, false),
            Err(KernelError::FontProgram(_))
        ));
    }
}
