use std::mem;
use std::path::Path;

use windows::Win32::Graphics::{Direct3D::ID3DBlob, Direct3D12::*, Dxgi::Common::*};

use super::shader::{ShaderCompiler, ShaderConfig};
use super::{device::Device, swap_chain::RENDER_TARGET_FORMAT, util::*};
use crate::blend::{BlendFactor, BlendMode, BlendOp};
use crate::error::{Error, Result};
use crate::scene::{ROOT_SLOT_MATERIAL, ROOT_SLOT_TEXTURE, ROOT_SLOT_TRANSFORM};

const _: () =
    assert!(ROOT_SLOT_MATERIAL == 0 && ROOT_SLOT_TEXTURE == 1 && ROOT_SLOT_TRANSFORM == 2);

/// Root parameters, indexed by the `ROOT_SLOT_*` constants:
/// material CBV (b0), texture table (t0) and transform CBV (b1),
/// plus a linear wrapping sampler (s0).
pub fn create_root_signature(device: &Device, name: &str) -> Result<ID3D12RootSignature> {
    let flags = D3D12_ROOT_SIGNATURE_FLAG_ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT
        | D3D12_ROOT_SIGNATURE_FLAG_DENY_HULL_SHADER_ROOT_ACCESS
        | D3D12_ROOT_SIGNATURE_FLAG_DENY_DOMAIN_SHADER_ROOT_ACCESS
        | D3D12_ROOT_SIGNATURE_FLAG_DENY_GEOMETRY_SHADER_ROOT_ACCESS;

    let srv_range = [D3D12_DESCRIPTOR_RANGE1 {
        RangeType: D3D12_DESCRIPTOR_RANGE_TYPE_SRV,
        NumDescriptors: 1,
        BaseShaderRegister: 0,
        RegisterSpace: 0,
        Flags: D3D12_DESCRIPTOR_RANGE_FLAG_NONE,
        OffsetInDescriptorsFromTableStart: D3D12_DESCRIPTOR_RANGE_OFFSET_APPEND,
    }];

    let params = [
        root_cbv(0, D3D12_SHADER_VISIBILITY_PIXEL),
        D3D12_ROOT_PARAMETER1 {
            ParameterType: D3D12_ROOT_PARAMETER_TYPE_DESCRIPTOR_TABLE,
            Anonymous: D3D12_ROOT_PARAMETER1_0 {
                DescriptorTable: D3D12_ROOT_DESCRIPTOR_TABLE1 {
                    NumDescriptorRanges: srv_range.len() as u32,
                    pDescriptorRanges: srv_range.as_ptr(),
                },
            },
            ShaderVisibility: D3D12_SHADER_VISIBILITY_PIXEL,
        },
        root_cbv(1, D3D12_SHADER_VISIBILITY_VERTEX),
    ];

    let samplers = [D3D12_STATIC_SAMPLER_DESC {
        Filter: D3D12_FILTER_MIN_MAG_MIP_LINEAR,
        AddressU: D3D12_TEXTURE_ADDRESS_MODE_WRAP,
        AddressV: D3D12_TEXTURE_ADDRESS_MODE_WRAP,
        AddressW: D3D12_TEXTURE_ADDRESS_MODE_WRAP,
        MipLODBias: 0.0,
        MaxAnisotropy: 0,
        ComparisonFunc: D3D12_COMPARISON_FUNC_NEVER,
        BorderColor: D3D12_STATIC_BORDER_COLOR_TRANSPARENT_BLACK,
        MinLOD: 0.0,
        MaxLOD: D3D12_FLOAT32_MAX,
        ShaderRegister: 0,
        RegisterSpace: 0,
        ShaderVisibility: D3D12_SHADER_VISIBILITY_PIXEL,
    }];

    let desc = D3D12_VERSIONED_ROOT_SIGNATURE_DESC {
        Version: D3D_ROOT_SIGNATURE_VERSION_1_1,
        Anonymous: D3D12_VERSIONED_ROOT_SIGNATURE_DESC_0 {
            Desc_1_1: D3D12_ROOT_SIGNATURE_DESC1 {
                NumParameters: params.len() as u32,
                pParameters: params.as_ptr(),
                NumStaticSamplers: samplers.len() as u32,
                pStaticSamplers: samplers.as_ptr(),
                Flags: flags,
            },
        },
    };

    let mut blob = None;
    let mut error = None;
    let result =
        unsafe { D3D12SerializeVersionedRootSignature(&desc, &mut blob, Some(&mut error)) };
    if let Some(e) = error {
        let message = unsafe { std::ffi::CStr::from_ptr(e.GetBufferPointer() as _) };
        return Err(Error::Gpu(message.to_string_lossy().into_owned()));
    }
    result?;

    let blob = blob.ok_or_else(|| Error::Gpu("empty root signature blob".into()))?;
    let root_signature: ID3D12RootSignature = unsafe {
        let data =
            std::slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize());
        device.get().CreateRootSignature(0, data)
    }?;

    set_name(&root_signature, name)?;

    Ok(root_signature)
}

fn root_cbv(register: u32, visibility: D3D12_SHADER_VISIBILITY) -> D3D12_ROOT_PARAMETER1 {
    D3D12_ROOT_PARAMETER1 {
        ParameterType: D3D12_ROOT_PARAMETER_TYPE_CBV,
        Anonymous: D3D12_ROOT_PARAMETER1_0 {
            Descriptor: D3D12_ROOT_DESCRIPTOR1 {
                ShaderRegister: register,
                RegisterSpace: 0,
                Flags: D3D12_ROOT_DESCRIPTOR_FLAG_NONE,
            },
        },
        ShaderVisibility: visibility,
    }
}

pub fn create_pso(
    device: &Device,
    root_signature: &ID3D12RootSignature,
    hlsl: &Path,
    blend_mode: BlendMode,
    debug: bool,
) -> Result<ID3D12PipelineState> {
    let compiler = ShaderCompiler::new(debug);
    let vertex_shader = compiler.compile_file(&ShaderConfig {
        path: hlsl.to_path_buf(),
        entry_point: "vs_main".into(),
        target: "vs_5_0".into(),
    })?;
    let pixel_shader = compiler.compile_file(&ShaderConfig {
        path: hlsl.to_path_buf(),
        entry_point: "ps_main".into(),
        target: "ps_5_0".into(),
    })?;

    let input_layout = [
        D3D12_INPUT_ELEMENT_DESC {
            SemanticName: windows::core::s!("POSITION"),
            SemanticIndex: 0,
            Format: DXGI_FORMAT_R32G32B32_FLOAT,
            InputSlot: 0,
            AlignedByteOffset: D3D12_APPEND_ALIGNED_ELEMENT,
            InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
            InstanceDataStepRate: 0,
        },
        D3D12_INPUT_ELEMENT_DESC {
            SemanticName: windows::core::s!("TEXCOORD"),
            SemanticIndex: 0,
            Format: DXGI_FORMAT_R32G32_FLOAT,
            InputSlot: 0,
            AlignedByteOffset: D3D12_APPEND_ALIGNED_ELEMENT,
            InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
            InstanceDataStepRate: 0,
        },
    ];

    let mut desc = D3D12_GRAPHICS_PIPELINE_STATE_DESC {
        pRootSignature: unsafe { mem::transmute_copy(root_signature) },

        VS: bytecode(&vertex_shader),
        PS: bytecode(&pixel_shader),

        BlendState: D3D12_BLEND_DESC {
            AlphaToCoverageEnable: false.into(),
            IndependentBlendEnable: false.into(),
            RenderTarget: [Default::default(); 8],
        },
        SampleMask: u32::MAX,
        RasterizerState: D3D12_RASTERIZER_DESC {
            FillMode: D3D12_FILL_MODE_SOLID,
            // the quad is seen from both sides while orbiting
            CullMode: D3D12_CULL_MODE_NONE,
            DepthClipEnable: true.into(),
            ..Default::default()
        },
        DepthStencilState: D3D12_DEPTH_STENCIL_DESC {
            DepthEnable: false.into(),
            StencilEnable: false.into(),
            ..Default::default()
        },

        InputLayout: D3D12_INPUT_LAYOUT_DESC {
            pInputElementDescs: input_layout.as_ptr(),
            NumElements: input_layout.len() as u32,
        },

        PrimitiveTopologyType: D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE,
        NumRenderTargets: 1,
        DSVFormat: DXGI_FORMAT_UNKNOWN,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },

        ..Default::default()
    };

    desc.BlendState.RenderTarget[0] = render_target_blend(blend_mode);
    desc.RTVFormats[0] = RENDER_TARGET_FORMAT;

    let pso: ID3D12PipelineState = unsafe { device.get().CreateGraphicsPipelineState(&desc) }?;

    set_name(&pso, &format!("quad_pso[{blend_mode:?}]"))?;
    Ok(pso)
}

fn bytecode(blob: &ID3DBlob) -> D3D12_SHADER_BYTECODE {
    D3D12_SHADER_BYTECODE {
        pShaderBytecode: unsafe { blob.GetBufferPointer() },
        BytecodeLength: unsafe { blob.GetBufferSize() },
    }
}

fn render_target_blend(mode: BlendMode) -> D3D12_RENDER_TARGET_BLEND_DESC {
    let state = mode.state();
    D3D12_RENDER_TARGET_BLEND_DESC {
        BlendEnable: true.into(),
        LogicOpEnable: false.into(),
        SrcBlend: blend_factor(state.src),
        DestBlend: blend_factor(state.dest),
        BlendOp: blend_op(state.op),
        SrcBlendAlpha: blend_factor(state.src_alpha),
        DestBlendAlpha: blend_factor(state.dest_alpha),
        BlendOpAlpha: blend_op(state.op_alpha),
        LogicOp: D3D12_LOGIC_OP_NOOP,
        RenderTargetWriteMask: D3D12_COLOR_WRITE_ENABLE_ALL.0 as u8,
    }
}

fn blend_factor(factor: BlendFactor) -> D3D12_BLEND {
    match factor {
        BlendFactor::Zero => D3D12_BLEND_ZERO,
        BlendFactor::One => D3D12_BLEND_ONE,
        BlendFactor::SrcAlpha => D3D12_BLEND_SRC_ALPHA,
        BlendFactor::InvSrcAlpha => D3D12_BLEND_INV_SRC_ALPHA,
        BlendFactor::InvDestColor => D3D12_BLEND_INV_DEST_COLOR,
    }
}

fn blend_op(op: BlendOp) -> D3D12_BLEND_OP {
    match op {
        BlendOp::Add => D3D12_BLEND_OP_ADD,
        BlendOp::RevSubtract => D3D12_BLEND_OP_REV_SUBTRACT,
    }
}
