use clap::ValueEnum;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum BlendMode {
    Add,
    Sub,
    ColorFlip,
    #[default]
    Alpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    InvSrcAlpha,
    InvDestColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendOp {
    Add,
    RevSubtract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendState {
    pub src: BlendFactor,
    pub dest: BlendFactor,
    pub op: BlendOp,
    pub src_alpha: BlendFactor,
    pub dest_alpha: BlendFactor,
    pub op_alpha: BlendOp,
}

impl BlendMode {
    /// Colour factors for the mode. Alpha always keeps the source value.
    pub fn state(self) -> BlendState {
        let (src, dest, op) = match self {
            Self::Add => (BlendFactor::One, BlendFactor::One, BlendOp::Add),
            Self::Sub => (BlendFactor::One, BlendFactor::One, BlendOp::RevSubtract),
            Self::ColorFlip => (BlendFactor::InvDestColor, BlendFactor::Zero, BlendOp::Add),
            Self::Alpha => (BlendFactor::SrcAlpha, BlendFactor::InvSrcAlpha, BlendOp::Add),
        };

        BlendState {
            src,
            dest,
            op,
            src_alpha: BlendFactor::One,
            dest_alpha: BlendFactor::Zero,
            op_alpha: BlendOp::Add,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_is_the_default() {
        let state = BlendMode::default().state();
        assert_eq!(state.src, BlendFactor::SrcAlpha);
        assert_eq!(state.dest, BlendFactor::InvSrcAlpha);
    }

    #[test]
    fn subtract_reverses_the_operation() {
        assert_eq!(BlendMode::Sub.state().op, BlendOp::RevSubtract);
        assert_eq!(BlendMode::Add.state().op, BlendOp::Add);
    }

    #[test]
    fn alpha_channel_is_the_same_for_every_mode() {
        for mode in BlendMode::value_variants() {
            let state = mode.state();
            assert_eq!(
                (state.src_alpha, state.dest_alpha, state.op_alpha),
                (BlendFactor::One, BlendFactor::Zero, BlendOp::Add)
            );
        }
    }
}
