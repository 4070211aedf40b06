use crate::{
    animation::anim::Animation,
    animation::mobject::MobjectSnapshot,
    foundation::core::{Point, Vec2},
};

pub fn fade_in() -> Animation {
    Animation::Fade { from: 0.0, to: 1.0 }
}

pub fn fade_out() -> Animation {
    Animation::Fade { from: 1.0, to: 0.0 }
}

pub fn shift(dx: f64, dy: f64) -> Animation {
    Animation::Shift {
        by: Vec2::new(dx, dy),
    }
}

pub fn move_to(x: f64, y: f64) -> Animation {
    Animation::MoveTo {
        target: Point::new(x, y),
    }
}

pub fn scale(factor: f64) -> Animation {
    Animation::Scale { factor }
}

pub fn rotate(angle: f64) -> Animation {
    Animation::Rotate { angle }
}

pub fn show_creation() -> Animation {
    Animation::ShowCreation
}

pub fn transform(target: MobjectSnapshot) -> Animation {
    Animation::Transform {
        target: Box::new(target),
    }
}

pub fn chain(children: impl IntoIterator<Item = Animation>) -> Animation {
    Animation::Chain(children.into_iter().collect())
}

pub fn group(children: impl IntoIterator<Item = Animation>) -> Animation {
    Animation::Group(children.into_iter().collect())
}
