// icons.rs
//
// Weather glyphs drawn beside the readings, sun for temperature and umbrella for humidity.

use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Arc as ArcShape, Circle, Line, PrimitiveStyle},
};

pub const ICON_SIZE: u32 = 11;
const R: i32 = ICON_SIZE as i32 / 2;

pub fn draw_sun<D>(target: &mut D, center: Point) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let stroke = PrimitiveStyle::with_stroke(BinaryColor::On, 1);
    Circle::with_center(center, 5)
        .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
        .draw(target)?;
    for (dx, dy) in [
        (0, 1),
        (1, 0),
        (0, -1),
        (-1, 0),
        (1, 1),
        (1, -1),
        (-1, 1),
        (-1, -1),
    ] {
        let d = Point::new(dx, dy);
        Line::new(center + d * (R - 1), center + d * R)
            .into_styled(stroke)
            .draw(target)?;
    }
    Ok(())
}

pub fn draw_umbrella<D>(target: &mut D, center: Point) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let stroke = PrimitiveStyle::with_stroke(BinaryColor::On, 1);
    // canopy
    ArcShape::with_center(center, ICON_SIZE, 180.0f32.deg(), 180.0f32.deg())
        .into_styled(stroke)
        .draw(target)?;
    Line::new(center - Point::new(R, 0), center + Point::new(R, 0))
        .into_styled(stroke)
        .draw(target)?;
    // handle and hook
    Line::new(center, center + Point::new(0, R - 1))
        .into_styled(stroke)
        .draw(target)?;
    Pixel(center + Point::new(-1, R), BinaryColor::On).draw(target)?;
    Pixel(center + Point::new(-2, R - 1), BinaryColor::On).draw(target)?;
    Ok(())
}


// EOF
