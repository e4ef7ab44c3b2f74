//! Vertical alignment: staff stacking within a system

/// Vertical slot of one staff in a system
#[derive(Clone, Debug, PartialEq)]
pub struct StaffAlignment {
    pub staff_n: u32,
    /// Top line of the staff, relative to the top of the system
    pub y_rel: f64,
    /// Distance between the top and bottom lines
    pub staff_height: f64,
    /// Largest extent above the top line over all measures of the system
    pub overflow_above: f64,
    /// Largest extent below the bottom line over all measures of the system
    pub overflow_below: f64,
    pub hidden: bool,
}

impl StaffAlignment {
    fn new(staff_n: u32, staff_height: f64, hidden: bool) -> Self {
        Self {
            staff_n,
            y_rel: 0.0,
            staff_height,
            overflow_above: 0.0,
            overflow_below: 0.0,
            hidden,
        }
    }

    /// Record a footprint given relative to the top line
    pub fn add_extent(&mut self, top: f64, bottom: f64) {
        if self.hidden {
            return;
        }
        self.overflow_above = self.overflow_above.max(-top);
        self.overflow_below = self.overflow_below.max(bottom - self.staff_height);
    }
}

/// Staff stacking of a system, in score order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SystemAligner {
    staves: Vec<StaffAlignment>,
    height: f64,
}

impl SystemAligner {
    pub fn reset(&mut self) {
        self.staves.clear();
        self.height = 0.0;
    }

    /// Get or append the slot of a staff
    pub fn ensure(&mut self, staff_n: u32, staff_height: f64, hidden: bool) -> &mut StaffAlignment {
        let index = match self.staves.iter().position(|s| s.staff_n == staff_n) {
            Some(index) => index,
            None => {
                self.staves
                    .push(StaffAlignment::new(staff_n, staff_height, hidden));
                self.staves.len() - 1
            }
        };
        &mut self.staves[index]
    }

    pub fn get(&self, staff_n: u32) -> Option<&StaffAlignment> {
        self.staves.iter().find(|s| s.staff_n == staff_n)
    }

    pub fn get_mut(&mut self, staff_n: u32) -> Option<&mut StaffAlignment> {
        self.staves.iter_mut().find(|s| s.staff_n == staff_n)
    }

    pub fn staves(&self) -> &[StaffAlignment] {
        &self.staves
    }

    /// Total height, overflows of the outer staves included
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Number of gaps between visible staves
    pub fn staff_gap_count(&self) -> usize {
        self.staves.iter().filter(|s| !s.hidden).count().saturating_sub(1)
    }

    /// Stack the staves top to bottom, `spacing` apart
    pub fn set_alignment_y_pos(&mut self, spacing: f64) {
        let mut cursor = 0.0;
        let mut first = true;
        for staff in self.staves.iter_mut() {
            if staff.hidden {
                staff.y_rel = cursor;
                continue;
            }
            if !first {
                cursor += spacing;
            }
            first = false;
            cursor += staff.overflow_above;
            staff.y_rel = cursor;
            cursor += staff.staff_height + staff.overflow_below;
        }
        self.height = cursor;
    }

    /// Push every visible staff after the first down by `per_gap` more
    pub fn justify(&mut self, per_gap: f64) {
        let mut shift = 0.0;
        let mut first = true;
        for staff in self.staves.iter_mut() {
            if !staff.hidden {
                if !first {
                    shift += per_gap;
                }
                first = false;
            }
            staff.y_rel += shift;
        }
        self.height += shift;
    }
}
