use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig,
        PaddingConfig2d, Relu,
    },
    prelude::*,
};

/// Input image side length; images are resized to IMG_SIZE x IMG_SIZE.
pub const IMG_SIZE: usize = 64;
/// Input channels (RGB).
pub const CHANNELS: usize = 3;

/// ResNet basic block: two 3x3 convolutions with a skip connection.
#[derive(Module, Debug)]
pub struct ResBlock<B: Backend> {
    conv1: Conv2d<B>,
    bn1: BatchNorm<B, 2>,
    conv2: Conv2d<B>,
    bn2: BatchNorm<B, 2>,
    activation: Relu,
    downsample: Option<Conv2d<B>>,
}

impl<B: Backend> ResBlock<B> {
    pub fn new(in_channels: usize, out_channels: usize, stride: usize, device: &B::Device) -> Self {
        let conv1 = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let bn1 = BatchNormConfig::new(out_channels).init(device);

        let conv2 = Conv2dConfig::new([out_channels, out_channels], [3, 3])
            .with_stride([1, 1])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let bn2 = BatchNormConfig::new(out_channels).init(device);

        let downsample = if stride != 1 || in_channels != out_channels {
            Some(
                Conv2dConfig::new([in_channels, out_channels], [1, 1])
                    .with_stride([stride, stride])
                    .init(device),
            )
        } else {
            None
        };

        Self {
            conv1,
            bn1,
            conv2,
            bn2,
            activation: Relu::new(),
            downsample,
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let residual = match &self.downsample {
            Some(conv) => conv.forward(input.clone()),
            None => input.clone(),
        };

        let x = self.conv1.forward(input);
        let x = self.bn1.forward(x);
        let x = self.activation.forward(x);

        let x = self.conv2.forward(x);
        let x = self.bn2.forward(x);

        let x = x.add(residual);
        self.activation.forward(x)
    }
}

/// Compact ResNet for single-label image classification.
/// Small enough to run comfortably on CPU for one-off predictions.
#[derive(Module, Debug)]
pub struct Model<B: Backend> {
    conv1: Conv2d<B>,
    bn1: BatchNorm<B, 2>,
    relu: Relu,

    layer1: ResBlock<B>,
    layer2: ResBlock<B>,
    layer3: ResBlock<B>,

    pool: AdaptiveAvgPool2d,
    dropout: Dropout,
    fc: Linear<B>,
}

impl<B: Backend> Model<B> {
    pub fn new(num_classes: usize, device: &B::Device) -> Self {
        let conv1 = Conv2dConfig::new([CHANNELS, 32], [5, 5])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(2, 2))
            .init(device);
        let bn1 = BatchNormConfig::new(32).init(device);

        let layer1 = ResBlock::new(32, 32, 1, device);
        let layer2 = ResBlock::new(32, 64, 2, device);
        let layer3 = ResBlock::new(64, 128, 2, device);

        let pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();
        let dropout = DropoutConfig::new(0.3).init();
        let fc = LinearConfig::new(128, num_classes).init(device);

        Self {
            conv1,
            bn1,
            relu: Relu::new(),
            layer1,
            layer2,
            layer3,
            pool,
            dropout,
            fc,
        }
    }

    /// Produces raw logits, one row per image: [batch, num_classes].
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let batch_size = input.dims()[0];

        let x = self.conv1.forward(input);
        let x = self.bn1.forward(x);
        let x = self.relu.forward(x);

        let x = self.layer1.forward(x);
        let x = self.layer2.forward(x);
        let x = self.layer3.forward(x);

        let x = self.pool.forward(x);
        let x = x.reshape([batch_size, 128]);

        let x = self.dropout.forward(x);
        self.fc.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    #[test]
    fn forward_produces_one_logit_row_per_image() {
        let device = Default::default();
        let model = Model::<NdArray>::new(3, &device);

        let input = Tensor::zeros([2, CHANNELS, IMG_SIZE, IMG_SIZE], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [2, 3]);
    }
}
