//! Flat RA/DEC projection of the object list, and pointer hit testing.
//!
//! RA grows left to right and DEC bottom to top. The data extent is padded
//! by half a degree on every side and the plot is inset by a fixed margin.

use tdlight_common::CelestialObject;

pub const MARGIN_PX: f64 = 40.0;
pub const PADDING_DEG: f64 = 0.5;
pub const HIT_RADIUS_PX: f64 = 10.0;

/// Cone of the last replace-mode cone search, drawn as a circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeOverlay {
    pub ra: f64,
    pub dec: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub x: f64,
    pub y: f64,
    pub r: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub ra_min: f64,
    pub ra_max: f64,
    pub dec_min: f64,
    pub dec_max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedPoint<'a> {
    pub object: &'a CelestialObject,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub extent: Extent,
}

impl Viewport {
    /// Fit a `width` x `height` viewport around every object that has
    /// coordinates. `None` if there are none.
    pub fn fit<'a>(
        width: f64,
        height: f64,
        objects: impl IntoIterator<Item = &'a CelestialObject>,
    ) -> Option<Self> {
        let mut extent: Option<Extent> = None;
        for (ra, dec) in objects.into_iter().filter_map(CelestialObject::position) {
            let e = extent.get_or_insert(Extent { ra_min: ra, ra_max: ra, dec_min: dec, dec_max: dec });
            e.ra_min = e.ra_min.min(ra);
            e.ra_max = e.ra_max.max(ra);
            e.dec_min = e.dec_min.min(dec);
            e.dec_max = e.dec_max.max(dec);
        }
        let e = extent?;
        Some(Self {
            width,
            height,
            extent: Extent {
                ra_min: e.ra_min - PADDING_DEG,
                ra_max: e.ra_max + PADDING_DEG,
                dec_min: e.dec_min - PADDING_DEG,
                dec_max: e.dec_max + PADDING_DEG,
            },
        })
    }

    fn plot_width(&self) -> f64 {
        self.width - 2.0 * MARGIN_PX
    }

    fn plot_height(&self) -> f64 {
        self.height - 2.0 * MARGIN_PX
    }

    pub fn project(&self, ra: f64, dec: f64) -> (f64, f64) {
        let e = &self.extent;
        let x = MARGIN_PX + (ra - e.ra_min) / (e.ra_max - e.ra_min) * self.plot_width();
        let y = MARGIN_PX + (e.dec_max - dec) / (e.dec_max - e.dec_min) * self.plot_height();
        (x, y)
    }

    /// Circle for a cone overlay. The radius is scaled along the RA axis.
    pub fn cone(&self, cone: &ConeOverlay) -> Circle {
        let (x, y) = self.project(cone.ra, cone.dec);
        let r = cone.radius / (self.extent.ra_max - self.extent.ra_min) * self.plot_width();
        Circle { x, y, r }
    }

    pub fn points<'a>(
        &self,
        objects: impl IntoIterator<Item = &'a CelestialObject>,
    ) -> Vec<ProjectedPoint<'a>> {
        objects
            .into_iter()
            .filter_map(|object| {
                let (ra, dec) = object.position()?;
                let (x, y) = self.project(ra, dec);
                Some(ProjectedPoint { object, x, y })
            })
            .collect()
    }

    /// Nearest object within [`HIT_RADIUS_PX`] of `(x, y)`.
    pub fn hit_test<'a>(
        &self,
        objects: impl IntoIterator<Item = &'a CelestialObject>,
        x: f64,
        y: f64,
    ) -> Option<&'a CelestialObject> {
        self.points(objects)
            .into_iter()
            .map(|p| (p.object, (p.x - x).hypot(p.y - y)))
            .filter(|&(_, d)| d <= HIT_RADIUS_PX)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(object, _)| object)
    }
}
