use super::{LinkError, ShaderProgram};

/// Ordered set of programs with one active entry.
#[derive(Debug, Default)]
pub struct ShaderCollection {
    programs: Vec<ShaderProgram>,
    active: usize,
}

impl ShaderCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, program: ShaderProgram) {
        self.programs.push(program);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Links every program, stopping at the first failure.
    pub fn link_all(&mut self) -> Result<(), (String, LinkError)> {
        for p in &mut self.programs {
            p.link().map_err(|e| (p.label().to_owned(), e))?;
        }
        Ok(())
    }

    #[inline]
    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> Option<&ShaderProgram> {
        self.programs.get(self.active)
    }

    pub fn active_mut(&mut self) -> Option<&mut ShaderProgram> {
        self.programs.get_mut(self.active)
    }

    /// Moves to the next program, wrapping around.
    pub fn cycle(&mut self) {
        if !self.programs.is_empty() {
            self.active = (self.active + 1) % self.programs.len();
        }
    }

    /// Out-of-range indices are ignored.
    pub fn switch_to(&mut self, index: usize) {
        if index < self.programs.len() {
            self.active = index;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShaderProgram> {
        self.programs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::test_support::{stages, BASIC_WGSL};

    fn collection(n: usize) -> ShaderCollection {
        let mut c = ShaderCollection::new();
        for i in 0..n {
            c.push(ShaderProgram::from_wgsl(format!("p{i}"), BASIC_WGSL).unwrap());
        }
        c
    }

    #[test]
    fn cycle_wraps() {
        let mut c = collection(3);
        c.cycle();
        c.cycle();
        assert_eq!(c.active().unwrap().label(), "p2");
        c.cycle();
        assert_eq!(c.active_index(), 0);
    }

    #[test]
    fn switch_out_of_range_is_ignored() {
        let mut c = collection(2);
        c.switch_to(1);
        c.switch_to(7);
        assert_eq!(c.active_index(), 1);
    }

    #[test]
    fn empty_collection_has_no_active() {
        let mut c = ShaderCollection::new();
        c.cycle();
        assert!(c.active().is_none());
        assert!(c.link_all().is_ok());
    }

    #[test]
    fn link_all_names_failing_program() {
        let mut c = collection(1);
        let (vs, _) = stages(BASIC_WGSL);
        let mut broken = ShaderProgram::new("broken");
        broken.attach(vs);
        c.push(broken);

        let (label, _) = c.link_all().unwrap_err();
        assert_eq!(label, "broken");
        assert!(c.iter().next().unwrap().is_ready());
    }
}
